//! Suite registration
//!
//! A suite is a tree of groups and leaves. Every group may carry hooks that
//! run around each leaf in its subtree: pre-leaf hooks outermost first,
//! post-leaf hooks innermost first.

mod runner;

pub use runner::{LeafReport, Outcome, RunReport, Runner};

use async_trait::async_trait;
use futures_util::future::BoxFuture;
use std::sync::Arc;

use crate::common::Result;
use crate::context::ContextSnapshot;

/// Executable body of a leaf
pub type LeafBody = Arc<dyn Fn() -> BoxFuture<'static, Result<()>> + Send + Sync>;

/// Hooks a group runs around every leaf in its subtree
#[async_trait]
pub trait LeafHooks: Send + Sync {
    /// Prepare shared state; the returned snapshot is handed back afterwards
    async fn before_leaf(&self) -> Result<ContextSnapshot>;

    /// Finish a leaf; `None` when `before_leaf` failed or never ran
    async fn after_leaf(&self, snapshot: Option<ContextSnapshot>) -> Result<()>;
}

/// A single test
pub struct Leaf {
    pub label: String,
    body: LeafBody,
}

impl Leaf {
    pub fn new(label: impl Into<String>, body: LeafBody) -> Self {
        Self {
            label: label.into(),
            body,
        }
    }
}

/// A node aggregating leaves and nested groups
pub struct Group {
    pub label: String,
    hooks: Option<Arc<dyn LeafHooks>>,
    groups: Vec<Group>,
    leaves: Vec<Leaf>,
}

impl Group {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            hooks: None,
            groups: Vec::new(),
            leaves: Vec::new(),
        }
    }

    /// Attach the hooks run around each leaf of this subtree
    pub fn set_hooks(&mut self, hooks: Arc<dyn LeafHooks>) {
        self.hooks = Some(hooks);
    }

    pub fn add_group(&mut self, group: Group) {
        self.groups.push(group);
    }

    pub fn add_leaf(&mut self, leaf: Leaf) {
        self.leaves.push(leaf);
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn leaves(&self) -> &[Leaf] {
        &self.leaves
    }

    /// Leaves in the whole subtree
    pub fn leaf_count(&self) -> usize {
        self.leaves.len() + self.groups.iter().map(Group::leaf_count).sum::<usize>()
    }

    /// Indented outline of the tree
    pub fn outline(&self) -> Vec<String> {
        let mut lines = Vec::new();
        self.outline_into(0, &mut lines);
        lines
    }

    fn outline_into(&self, depth: usize, lines: &mut Vec<String>) {
        let indent = "  ".repeat(depth);
        lines.push(format!("{}{}", indent, self.label));
        for group in &self.groups {
            group.outline_into(depth + 1, lines);
        }
        for leaf in &self.leaves {
            lines.push(format!("{}  - {}", indent, leaf.label));
        }
    }
}
