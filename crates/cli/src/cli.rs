//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

/// pusher - deliver every line of stdin to an HTTP endpoint at a steady rate
#[derive(Parser, Debug)]
#[command(
    name = "pusher",
    author,
    version,
    about = "Rate-limited concurrent line delivery",
    long_about = "Reads lines from standard input and POSTs each one to a target URL.\n\n\
                  One line is admitted per interval; deliveries run concurrently and \n\
                  every failure is reported with the line that caused it."
)]
pub struct Cli {
    /// Increase verbosity (-v traces every line and enables debug logs, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "PUSHER_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "PUSHER_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Push stdin lines to the target
    Run(RunArgs),

    /// Validate a settings file without running
    Validate(ValidateArgs),
}

/// Arguments for the `run` command
///
/// Every flag overrides the matching value from the settings file.
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to settings file (TOML or JSON)
    #[arg(short, long, env = "PUSHER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Target URL receiving one POST per line
    #[arg(short = 't', long = "target", env = "PUSHER_TARGET")]
    pub target: Option<String>,

    /// Minimum time between two deliveries (e.g. "1ms", "250ms", "1s")
    #[arg(short, long, env = "PUSHER_INTERVAL", value_parser = humantime::parse_duration)]
    pub interval: Option<Duration>,

    /// Never deliver empty lines
    #[arg(short = 's', long, env = "PUSHER_SKIP_EMPTY_LINES")]
    pub skip_empty_lines: bool,

    /// Per-request timeout
    #[arg(long, env = "PUSHER_TIMEOUT", value_parser = humantime::parse_duration)]
    pub timeout: Option<Duration>,

    /// Abort the run after this long
    #[arg(long, env = "PUSHER_DEADLINE", value_parser = humantime::parse_duration)]
    pub deadline: Option<Duration>,

    /// Cap on concurrently running deliveries (default: unbounded)
    #[arg(long, env = "PUSHER_MAX_IN_FLIGHT", value_parser = clap::value_parser!(u64).range(1..))]
    pub max_in_flight: Option<u64>,

    /// Prometheus metrics port (disabled when unset)
    #[arg(long, env = "PUSHER_METRICS_PORT")]
    pub metrics_port: Option<u16>,

    /// Log each line instead of sending it
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to settings file to validate
    #[arg(short, long, default_value = "pusher.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
