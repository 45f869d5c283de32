//! # pusher CLI
//!
//! Command-line entry point.
//!
//! Provides:
//! - Settings loading and validation
//! - Pipeline orchestration over stdin
//! - Graceful shutdown on signals or deadline

mod cli;
mod commands;
mod error;
mod pipeline;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use observability::ObservabilityConfig;
use tracing::{debug, error};

use cli::{Cli, Commands};
use commands::{run_pipeline, run_validate};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    init_logging(&cli)?;

    debug!(version = env!("CARGO_PKG_VERSION"), "pusher starting");

    let result = match &cli.command {
        Commands::Run(args) => run_pipeline(args, cli.verbose > 0).await,
        Commands::Validate(args) => run_validate(args).map(|()| ExitCode::SUCCESS),
    };

    if let Err(ref e) = result {
        error!(error = %e, "Command failed");
    }

    result
}

/// Initialize logging based on CLI options
fn init_logging(cli: &Cli) -> Result<()> {
    let default_log_level = if cli.quiet {
        "warn"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    observability::init_with_config(ObservabilityConfig {
        log_format: cli.log_format.into(),
        metrics_port: None,
        default_log_level: default_log_level.to_string(),
    })
}
