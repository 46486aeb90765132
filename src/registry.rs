//! Name-keyed registries for cleaners and presetters

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::common::{Error, Result};

/// Something registered under a unique name
pub trait Named {
    fn name(&self) -> &str;
}

/// Registry of named capabilities
///
/// Registration is all-or-nothing per call: every name is checked before
/// anything is inserted.
pub struct Registry<T: ?Sized + Named> {
    kind: &'static str,
    items: HashMap<String, Arc<T>>,
}

impl<T: ?Sized + Named> Registry<T> {
    /// Create an empty registry; `kind` names the items in error messages
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            items: HashMap::new(),
        }
    }

    /// Register every item, or none of them if any name is taken
    pub fn register<I>(&mut self, items: I) -> Result<()>
    where
        I: IntoIterator<Item = Arc<T>>,
    {
        let items: Vec<Arc<T>> = items.into_iter().collect();

        let mut seen = HashSet::new();
        for item in &items {
            let name = item.name();
            if self.items.contains_key(name) || !seen.insert(name) {
                return Err(Error::already_registered(self.kind, name));
            }
        }

        for item in items {
            tracing::debug!("Registered {} '{}'", self.kind, item.name());
            self.items.insert(item.name().to_string(), item);
        }
        Ok(())
    }

    /// Exact-name lookup
    pub fn get(&self, name: &str) -> Option<Arc<T>> {
        self.items.get(name).cloned()
    }
}

impl<T: ?Sized + Named> Clone for Registry<T> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            items: self.items.clone(),
        }
    }
}
