//! `run` command implementation.

use std::process::ExitCode;

use anyhow::{Context, Result};
use contracts::PusherSettings;
use tracing::info;

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::pipeline::{Pipeline, PipelineOptions};

/// Execute the `run` command
///
/// Exits with failure when any error was reported or the run was aborted.
pub async fn run_pipeline(args: &RunArgs, verbose: bool) -> Result<ExitCode> {
    let settings = resolve_settings(args, verbose)?;

    if settings.target.url.is_none() && !args.dry_run {
        return Err(CliError::MissingTarget.into());
    }

    info!(
        target_url = settings.target.url.as_deref().unwrap_or("-"),
        interval = %humantime::format_duration(settings.pipeline.interval),
        skip_empty_lines = settings.pipeline.skip_empty_lines,
        dry_run = args.dry_run,
        "Configuration loaded"
    );

    let pipeline = Pipeline::new(PipelineOptions {
        settings,
        deadline: args.deadline,
        dry_run: args.dry_run,
    });

    let stats = pipeline.run(tokio::io::stdin()).await?;
    stats.print_summary();

    if stats.is_clean() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

/// Load the settings file (if any) and apply command line overrides
fn resolve_settings(args: &RunArgs, verbose: bool) -> Result<PusherSettings> {
    let mut settings = match &args.config {
        Some(path) => {
            info!(config = %path.display(), "Loading configuration");
            config_loader::ConfigLoader::load_from_path(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?
        }
        None => PusherSettings::default(),
    };

    apply_overrides(&mut settings, args, verbose);

    config_loader::ConfigLoader::validate(&settings)
        .map_err(|e| CliError::config_validation(e.to_string()))?;

    Ok(settings)
}

fn apply_overrides(settings: &mut PusherSettings, args: &RunArgs, verbose: bool) {
    if let Some(ref url) = args.target {
        settings.target.url = Some(url.clone());
    }
    if let Some(interval) = args.interval {
        settings.pipeline.interval = interval;
    }
    if let Some(timeout) = args.timeout {
        settings.target.request_timeout = timeout;
    }
    if let Some(max) = args.max_in_flight {
        settings.pipeline.max_in_flight = usize::try_from(max).ok();
    }
    if args.metrics_port.is_some() {
        settings.metrics_port = args.metrics_port;
    }
    // flags can only switch these on
    settings.pipeline.skip_empty_lines |= args.skip_empty_lines;
    settings.pipeline.verbose |= verbose;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use std::io::Write;
    use std::time::Duration;

    fn run_args(argv: &[&str]) -> RunArgs {
        let mut full = vec!["pusher", "run"];
        full.extend_from_slice(argv);
        match Cli::try_parse_from(full).unwrap().command {
            Commands::Run(args) => args,
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_flags_override_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[target]\nurl = \"http://file.example/\"\n\n[pipeline]\ninterval = \"1s\"\n"
        )
        .unwrap();
        let path = file.path().display().to_string();

        let args = run_args(&["-c", &path, "-t", "http://flag.example/", "-s"]);
        let settings = resolve_settings(&args, false).unwrap();

        assert_eq!(settings.target.url.as_deref(), Some("http://flag.example/"));
        assert_eq!(settings.pipeline.interval, Duration::from_secs(1));
        assert!(settings.pipeline.skip_empty_lines);
        assert!(!settings.pipeline.verbose);
    }

    #[test]
    fn test_defaults_without_file() {
        let args = run_args(&["-i", "5ms", "--max-in-flight", "3"]);
        let settings = resolve_settings(&args, true).unwrap();

        assert_eq!(settings.target.url, None);
        assert_eq!(settings.pipeline.interval, Duration::from_millis(5));
        assert_eq!(settings.pipeline.max_in_flight, Some(3));
        assert!(settings.pipeline.verbose);
    }

    #[test]
    fn test_invalid_target_scheme() {
        let args = run_args(&["-t", "ftp://example.com/"]);
        assert!(resolve_settings(&args, false).is_err());
    }
}
