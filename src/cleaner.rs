//! Group teardown
//!
//! A cleaner runs once when every leaf under the group that binds it has
//! finished, with the group's variables as they were before any leaf ran.

use async_trait::async_trait;

use crate::common::Result;
use crate::context::Variables;
use crate::registry::{Named, Registry};

/// Named teardown action
#[async_trait]
pub trait Cleaner: Named + Send + Sync {
    async fn clean(&self, variables: &Variables) -> Result<()>;
}

pub type CleanerRegistry = Registry<dyn Cleaner>;

impl CleanerRegistry {
    pub fn cleaners() -> Self {
        Registry::new("cleaner")
    }
}
