//! Suite assembly from a loaded directory model

use futures_util::FutureExt;
use std::sync::Arc;

use crate::context::ContextHandle;
use crate::data::{Case, Dir};
use crate::lifecycle::{GroupLifecycle, Harness};
use crate::suite::{Group, Leaf, LeafBody};

/// Compiles directories into suite groups
pub struct Builder {
    harness: Arc<Harness>,
}

impl Builder {
    pub fn new(harness: Arc<Harness>) -> Self {
        Self { harness }
    }

    /// Build the group for `dir`
    ///
    /// Every group of the tree shares `ctx`; each gets its own lifecycle
    /// (counter and mutex).
    pub fn build(&self, ctx: &ContextHandle, label: &str, dir: &Dir) -> Group {
        let mut group = Group::new(label);

        for (name, child) in &dir.dirs {
            let child_label = summary(name, &child.context.summary);
            group.add_group(self.build(ctx, &child_label, child));
        }

        for (name, file) in &dir.files {
            let leaf_label = summary(name, &file.case.description);
            group.add_leaf(Leaf::new(leaf_label, self.leaf_body(ctx, &file.case)));
        }

        group.set_hooks(Arc::new(GroupLifecycle::new(
            label,
            ctx.clone(),
            dir.context.clone(),
            dir.case_num,
            self.harness.clone(),
        )));
        group
    }

    fn leaf_body(&self, ctx: &ContextHandle, case: &Case) -> LeafBody {
        let ctx = ctx.clone();
        let flow = Arc::new(case.flow.clone());
        let harness = self.harness.clone();

        Arc::new(move || {
            let ctx = ctx.clone();
            let flow = flow.clone();
            let harness = harness.clone();
            async move { harness.executor.run_flow(&ctx, &flow).await }.boxed()
        })
    }
}

/// Label for a group or leaf
pub fn summary(name: &str, summary: &str) -> String {
    format!("{}: {}", name, summary)
}
