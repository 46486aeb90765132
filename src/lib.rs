//! aloe - a declarative engine for hierarchical API integration tests
//!
//! A tree of test cases is loaded from a data directory, compiled into nested
//! groups and leaves, and executed against a live HTTP target. Groups share
//! inheritable state, leaves capture variables from responses, and every group
//! is torn down exactly once after its whole subtree has run.

pub mod builder;
pub mod cleaner;
pub mod cli;
pub mod commands;
pub mod common;
pub mod context;
pub mod data;
pub mod framework;
pub mod lifecycle;
pub mod preset;
pub mod registry;
pub mod roundtrip;
pub mod suite;

// Re-export commonly used types for tests
pub use cleaner::Cleaner;
pub use common::{Error, Result};
pub use context::{Context, Variables};
pub use framework::Framework;
pub use preset::Presetter;
pub use registry::Named;
