//! aloe - declarative API integration tests
//!
//! Runs directory trees of YAML test cases against a live HTTP target.

use clap::Parser;
use std::path::PathBuf;

use aloe::commands::Commands;
use aloe::{cli, common::logging};

#[derive(Parser)]
#[command(name = "aloe", about = "Declarative, data-driven API test runner")]
#[command(version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Debug-level logging
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Held until exit so the file writer flushes
    let _log_guard = logging::init_cli(cli.verbose, cli.log_file.as_deref());

    match cli::dispatch(cli.command).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
