//! CLI command definitions
//!
//! Defines the clap commands for the aloe CLI.

use clap::{Args, Subcommand};
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Run test suites against an HTTP target
    Run {
        #[command(flatten)]
        source: SourceArgs,

        /// Base URL of the target (overrides the config file)
        #[arg(long)]
        host: Option<String>,

        /// Maximum number of leaves running at once (one per data directory)
        #[arg(long, short = 'j')]
        parallel: Option<usize>,

        /// Only print the summary, not a line per leaf
        #[arg(long, short)]
        quiet: bool,
    },

    /// Print the suite tree without running anything
    List {
        #[command(flatten)]
        source: SourceArgs,
    },
}

/// Where test data and configuration come from
#[derive(Args)]
pub struct SourceArgs {
    /// Data directories, one suite per directory (overrides the config file)
    pub dirs: Vec<PathBuf>,

    /// Configuration file (default: the platform config directory's config.toml)
    #[arg(long, short)]
    pub config: Option<PathBuf>,
}
