//! Framework entry point
//!
//! Owns the cleaner and presetter registries and turns the configured data
//! roots into suites: one fresh context per root.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::builder::Builder;
use crate::cleaner::{Cleaner, CleanerRegistry};
use crate::common::config::{Config, EventuallyConfig};
use crate::common::Result;
use crate::context::Context;
use crate::data::{self, Dir};
use crate::lifecycle::Harness;
use crate::preset::{Presetter, PresetterRegistry};
use crate::roundtrip::{Executor, HttpClient, Transport};
use crate::suite::{Group, RunReport, Runner};

/// API test framework
pub struct Framework {
    data_dirs: Vec<PathBuf>,
    transport: Arc<dyn Transport>,
    eventually: EventuallyConfig,
    parallelism: usize,
    progress: bool,
    cleaners: CleanerRegistry,
    presetters: PresetterRegistry,
}

impl Framework {
    /// Create a framework sending requests to `host`
    ///
    /// The `request-header` and `response-header` presetters are registered.
    pub fn new(host: &str, data_dirs: Vec<PathBuf>) -> Result<Self> {
        let mut config = Config::default();
        config.target.host = host.to_string();
        config.data.dirs = data_dirs;
        Self::from_config(&config)
    }

    /// Create a framework from a loaded configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = HttpClient::new(
            &config.target.host,
            Duration::from_secs(config.target.request_timeout_secs),
        )?;
        Ok(Self {
            data_dirs: config.data.dirs.clone(),
            transport: Arc::new(client),
            eventually: config.eventually,
            parallelism: config.runner.parallelism,
            progress: false,
            cleaners: CleanerRegistry::cleaners(),
            presetters: PresetterRegistry::presetters(),
        })
    }

    /// Replace the HTTP transport
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = transport;
        self
    }

    /// Leaves in flight at once; leaves of one data root always run in turn
    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism.max(1);
        self
    }

    /// Print a line per finished leaf while running
    pub fn with_progress(mut self, enabled: bool) -> Self {
        self.progress = enabled;
        self
    }

    /// Register cleaners; fails without registering any if a name is taken
    pub fn register_cleaner<I>(&mut self, cleaners: I) -> Result<()>
    where
        I: IntoIterator<Item = Arc<dyn Cleaner>>,
    {
        self.cleaners.register(cleaners)
    }

    /// Register presetters; fails without registering any if a name is taken
    pub fn register_presetter<I>(&mut self, presetters: I) -> Result<()>
    where
        I: IntoIterator<Item = Arc<dyn Presetter>>,
    {
        self.presetters.register(presetters)
    }

    /// Load every data root, stopping at the first failure
    fn load_all(&self) -> Result<Vec<Dir>> {
        self.data_dirs
            .iter()
            .map(|root| {
                tracing::info!("Loading test data from {}", root.display());
                data::load(root)
            })
            .collect()
    }

    /// Assemble one suite per data root
    fn build_suites(&self) -> Result<Vec<Group>> {
        let roots = self.load_all()?;

        let harness = Arc::new(Harness {
            executor: Executor::new(self.transport.clone(), self.eventually),
            cleaners: self.cleaners.clone(),
            presetters: self.presetters.clone(),
        });
        let builder = Builder::new(harness);

        Ok(roots
            .iter()
            .map(|dir| builder.build(&Context::new_handle(), &dir.context.summary, dir))
            .collect())
    }

    /// Load, assemble and run every suite
    pub async fn run(&self) -> Result<RunReport> {
        let suites = self.build_suites()?;
        let report = Runner::new(self.parallelism)
            .with_progress(self.progress)
            .run(&suites)
            .await;
        tracing::info!(
            "Finished: {} passed, {} failed",
            report.passed(),
            report.failed()
        );
        Ok(report)
    }

    /// Outline of every suite without running anything
    pub fn list(&self) -> Result<Vec<String>> {
        Ok(self
            .build_suites()?
            .iter()
            .flat_map(Group::outline)
            .collect())
    }
}
