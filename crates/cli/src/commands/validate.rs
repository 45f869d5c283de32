//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::PusherSettings;
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    target_url: Option<String>,
    request_timeout: String,
    interval: String,
    queue_capacity: usize,
    skip_empty_lines: bool,
    max_in_flight: Option<usize>,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{json}");
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(settings) => {
            let warnings = collect_warnings(&settings);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: (!warnings.is_empty()).then_some(warnings),
                summary: Some(summarize(&settings)),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

fn summarize(settings: &PusherSettings) -> ConfigSummary {
    ConfigSummary {
        version: format!("{:?}", settings.version),
        target_url: settings.target.url.clone(),
        request_timeout: humantime::format_duration(settings.target.request_timeout).to_string(),
        interval: humantime::format_duration(settings.pipeline.interval).to_string(),
        queue_capacity: settings.pipeline.queue_capacity,
        skip_empty_lines: settings.pipeline.skip_empty_lines,
        max_in_flight: settings.pipeline.max_in_flight,
    }
}

/// Collect non-fatal issues
fn collect_warnings(settings: &PusherSettings) -> Vec<String> {
    let mut warnings = Vec::new();

    if settings.target.url.is_none() {
        warnings.push("No target.url configured - it must be given with --target".to_string());
    }

    if settings.pipeline.interval.is_zero() && settings.pipeline.max_in_flight.is_none() {
        warnings.push(
            "interval is 0 and max_in_flight is unset - deliveries are unthrottled".to_string(),
        );
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!(
                "  Target: {}",
                summary.target_url.as_deref().unwrap_or("(from command line)")
            );
            println!("  Request timeout: {}", summary.request_timeout);
            println!("  Interval: {}", summary.interval);
            println!("  Queue capacity: {}", summary.queue_capacity);
            println!("  Skip empty lines: {}", summary.skip_empty_lines);
            match summary.max_in_flight {
                Some(max) => println!("  Max in flight: {max}"),
                None => println!("  Max in flight: unbounded"),
            }
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {warning}");
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {error}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn args_for(file: &tempfile::NamedTempFile) -> ValidateArgs {
        ValidateArgs {
            config: file.path().to_path_buf(),
            json: true,
        }
    }

    #[test]
    fn test_valid_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[target]\nurl = \"http://localhost:8080/\"").unwrap();

        let result = validate_config(&args_for(&file));
        assert!(result.valid);
        assert!(result.warnings.is_none());
        assert_eq!(result.summary.unwrap().interval, "1ms");
    }

    #[test]
    fn test_missing_target_is_a_warning() {
        let file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();

        let result = validate_config(&args_for(&file));
        assert!(result.valid);
        assert_eq!(result.warnings.map(|w| w.len()), Some(1));
    }

    #[test]
    fn test_invalid_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[pipeline]\nqueue_capacity = 0").unwrap();

        let result = validate_config(&args_for(&file));
        assert!(!result.valid);
        assert!(result.error.is_some());
        assert!(run_validate(&args_for(&file)).is_err());
    }
}
