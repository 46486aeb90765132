//! Shared per-group test state
//!
//! One [`Context`] exists per data root. Every group and leaf of that root
//! reaches it through a cloned [`ContextHandle`]; the instance is never
//! replaced, only its contents are rebuilt, snapshotted and restored.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::roundtrip::RoundTrip;

/// Bound variables: name -> value
pub type Variables = HashMap<String, Value>;

/// Handle to the context shared by a whole tree walk
pub type ContextHandle = Arc<Mutex<Context>>;

/// Mutable state inherited by descendant groups and leaves
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Variables visible to templates and matchers
    pub variables: Variables,
    /// Name of the cleaner to run when the owning group drains
    pub cleaner_name: Option<String>,
    /// Round trip every step is merged onto
    pub round_trip_template: RoundTrip,
}

impl Context {
    /// Create a fresh handle for a top-level suite
    pub fn new_handle() -> ContextHandle {
        Arc::new(Mutex::new(Context::default()))
    }

    /// Deep copy of the restorable fields
    pub fn snapshot(&self) -> ContextSnapshot {
        ContextSnapshot {
            variables: self.variables.clone(),
            cleaner_name: self.cleaner_name.clone(),
            round_trip_template: self.round_trip_template.clone(),
        }
    }

    /// Roll back to a snapshot, discarding everything captured since
    pub fn restore(&mut self, snapshot: &ContextSnapshot) {
        self.variables = snapshot.variables.clone();
        self.cleaner_name = snapshot.cleaner_name.clone();
        self.round_trip_template = snapshot.round_trip_template.clone();
    }

    /// Insert captured variables, overwriting existing names
    pub fn bind(&mut self, captured: Variables) {
        self.variables.extend(captured);
    }
}

/// Immutable copy of a context taken before a leaf runs
#[derive(Debug, Clone, PartialEq)]
pub struct ContextSnapshot {
    pub variables: Variables,
    pub cleaner_name: Option<String>,
    pub round_trip_template: RoundTrip,
}
