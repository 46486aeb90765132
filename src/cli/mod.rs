//! CLI command handling
//!
//! Resolves configuration, drives the framework and formats output.

use colored::Colorize;

use crate::commands::{Commands, SourceArgs};
use crate::common::config::Config;
use crate::common::{Error, Result};
use crate::framework::Framework;

/// Dispatch a CLI command
///
/// Returns whether every test passed.
pub async fn dispatch(command: Commands) -> Result<bool> {
    match command {
        Commands::Run {
            source,
            host,
            parallel,
            quiet,
        } => {
            let mut config = resolve_config(&source)?;
            if let Some(host) = host {
                config.target.host = host;
            }
            if let Some(parallel) = parallel {
                config.runner.parallelism = parallel.max(1);
            }

            println!(
                "\n{} {}",
                "Running against".blue().bold(),
                config.target.host.white().bold()
            );
            let framework = Framework::from_config(&config)?.with_progress(!quiet);
            let report = framework.run().await?;
            report.print_summary();
            Ok(report.is_success())
        }

        Commands::List { source } => {
            let config = resolve_config(&source)?;
            let framework = Framework::from_config(&config)?;
            for line in framework.list()? {
                println!("{}", line);
            }
            Ok(true)
        }
    }
}

/// Load the config file and apply data directory overrides
fn resolve_config(source: &SourceArgs) -> Result<Config> {
    let mut config = match &source.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if !source.dirs.is_empty() {
        config.data.dirs = source.dirs.clone();
    }
    if config.data.dirs.is_empty() {
        return Err(Error::Config(
            "No data directories given. Pass them as arguments or set data.dirs in the config file"
                .to_string(),
        ));
    }
    Ok(config)
}
