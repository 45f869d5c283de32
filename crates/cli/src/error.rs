//! Error types for CLI operations.

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Neither the settings file nor the command line names a target
    #[error("No target URL given: pass --target, set PUSHER_TARGET or target.url, or use --dry-run")]
    MissingTarget,

    /// Delivery target could not be built
    #[error("Failed to set up delivery target: {0}")]
    Target(#[from] dispatcher::DispatcherError),

    /// Settings assembled from file and flags are invalid
    #[error("Configuration validation failed: {message}")]
    ConfigValidation { message: String },
}

impl CliError {
    pub fn config_validation(message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            message: message.into(),
        }
    }
}
