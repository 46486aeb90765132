//! Per-group context lifecycle
//!
//! Every leaf in a group's subtree passes through the group's hooks:
//!
//! * pre-leaf: construct the group's state onto the shared context, then
//!   snapshot it;
//! * post-leaf: restore the snapshot (dropping the leaf's captures), count the
//!   leaf, and run the group's cleaner once the whole subtree has finished.
//!
//! Both phases hold the group mutex for their full sequence. The first
//! successful pre-leaf phase of an activation performs a full construct (the
//! group's setup flow runs); every later one performs a partial construct that
//! re-applies the recorded result instead.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::cleaner::CleanerRegistry;
use crate::common::{Error, Result};
use crate::context::{ContextHandle, ContextSnapshot, Variables};
use crate::data::GroupConfig;
use crate::preset::PresetterRegistry;
use crate::roundtrip::merge::merge;
use crate::roundtrip::template::expand_value;
use crate::roundtrip::Executor;
use crate::suite::LeafHooks;

/// Executor and registries shared by every group of a run
pub struct Harness {
    pub executor: Executor,
    pub cleaners: CleanerRegistry,
    pub presetters: PresetterRegistry,
}

/// How much of the group configuration a construct applies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstructMode {
    /// Template, cleaner, presetters and static variables, then the setup
    /// flow; the resulting variables become the group baseline
    Full,
    /// Template, cleaner, presetters and static variables, then the recorded
    /// baseline; the setup flow is not repeated
    Partial,
}

/// Lifecycle phase of a group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    Active,
    Drained,
}

#[derive(Debug, Default)]
struct GroupState {
    /// A full construct has succeeded this activation
    started: bool,
    /// Leaves whose post-leaf phase ran
    completed: usize,
    /// Variables after the full construct
    baseline: Variables,
}

/// Hooks for one group, closing over its context, configuration and counter
pub struct GroupLifecycle {
    label: String,
    ctx: ContextHandle,
    config: GroupConfig,
    total: usize,
    harness: Arc<Harness>,
    state: Mutex<GroupState>,
}

impl GroupLifecycle {
    /// `total` is the number of leaves in the group's whole subtree
    pub fn new(
        label: impl Into<String>,
        ctx: ContextHandle,
        config: GroupConfig,
        total: usize,
        harness: Arc<Harness>,
    ) -> Self {
        Self {
            label: label.into(),
            ctx,
            config,
            total,
            harness,
            state: Mutex::new(GroupState::default()),
        }
    }

    pub async fn phase(&self) -> Phase {
        let state = self.state.lock().await;
        if state.completed >= self.total && self.total > 0 {
            Phase::Drained
        } else if state.started {
            Phase::Active
        } else {
            Phase::Uninitialized
        }
    }

    /// Apply the group configuration onto the shared context
    async fn construct(&self, mode: ConstructMode, state: &mut GroupState) -> Result<()> {
        {
            let mut ctx = self.ctx.lock().await;

            if let Some(template) = &self.config.round_trip_template {
                ctx.round_trip_template = merge(&ctx.round_trip_template, template);
            }
            ctx.cleaner_name = self.config.cleaner.clone();

            for preset in &self.config.presetters {
                let presetter = self
                    .harness
                    .presetters
                    .get(&preset.name)
                    .ok_or_else(|| Error::UnknownPresetter(preset.name.clone()))?;
                presetter.preset(&preset.args, &mut ctx)?;
            }

            for (name, value) in &self.config.variables {
                let value = expand_value(value, &ctx.variables)?;
                ctx.variables.insert(name.clone(), value);
            }

            if mode == ConstructMode::Partial {
                ctx.bind(state.baseline.clone());
                return Ok(());
            }
        }

        if !self.config.flow.is_empty() {
            tracing::info!("Setting up {}", self.label);
            self.harness
                .executor
                .run_flow(&self.ctx, &self.config.flow)
                .await?;
        }
        state.baseline = self.ctx.lock().await.variables.clone();
        Ok(())
    }
}

#[async_trait]
impl LeafHooks for GroupLifecycle {
    async fn before_leaf(&self) -> Result<ContextSnapshot> {
        let mut state = self.state.lock().await;
        if self.total > 0 && state.completed >= self.total {
            return Err(Error::GroupDrained(self.label.clone()));
        }

        let mode = if state.started {
            ConstructMode::Partial
        } else {
            ConstructMode::Full
        };
        tracing::debug!("{:?} construct for {}", mode, self.label);

        let rollback = self.ctx.lock().await.snapshot();
        if let Err(e) = self.construct(mode, &mut state).await {
            self.ctx.lock().await.restore(&rollback);
            return Err(e);
        }
        state.started = true;

        Ok(self.ctx.lock().await.snapshot())
    }

    async fn after_leaf(&self, snapshot: Option<ContextSnapshot>) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.completed >= self.total {
            return Err(Error::GroupDrained(self.label.clone()));
        }

        let (cleaner_name, variables) = match &snapshot {
            Some(snapshot) => {
                let mut ctx = self.ctx.lock().await;
                ctx.restore(snapshot);
                (ctx.cleaner_name.clone(), ctx.variables.clone())
            }
            None => (self.config.cleaner.clone(), state.baseline.clone()),
        };

        state.completed += 1;
        tracing::debug!("{}: {}/{} leaves done", self.label, state.completed, self.total);
        if state.completed < self.total {
            return Ok(());
        }

        let Some(name) = cleaner_name else {
            return Ok(());
        };
        match self.harness.cleaners.get(&name) {
            Some(cleaner) => {
                tracing::info!("Cleaning up {} with '{}'", self.label, name);
                cleaner
                    .clean(&variables)
                    .await
                    .map_err(|e| Error::cleanup(&name, e))
            }
            None => {
                tracing::warn!("Cleaner '{}' for {} is not registered", name, self.label);
                Ok(())
            }
        }
    }
}
