//! PusherSettings - Config Loader output
//!
//! Describes one complete run: where to deliver, how fast, and which
//! pipeline options apply.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

use crate::PipelineConfig;

/// Default per-request timeout of the HTTP target
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Default request content type
pub const DEFAULT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete settings for one pusher run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct PusherSettings {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Delivery target
    #[serde(default)]
    #[validate(nested)]
    pub target: TargetSettings,

    /// Pipeline options
    #[serde(default)]
    #[validate(nested)]
    pub pipeline: PipelineConfig,

    /// Prometheus exporter port (None = disabled)
    #[serde(default)]
    pub metrics_port: Option<u16>,
}

/// HTTP delivery target settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct TargetSettings {
    /// Endpoint receiving one POST per line; may also come from the CLI
    #[serde(default)]
    #[validate(url)]
    pub url: Option<String>,

    /// Per-request timeout
    #[serde(with = "humantime_serde", default = "default_request_timeout")]
    pub request_timeout: Duration,

    /// Content-Type header sent with every message
    #[serde(default = "default_content_type")]
    #[validate(length(min = 1))]
    pub content_type: String,
}

fn default_request_timeout() -> Duration {
    DEFAULT_REQUEST_TIMEOUT
}

fn default_content_type() -> String {
    DEFAULT_CONTENT_TYPE.to_string()
}

impl Default for TargetSettings {
    fn default() -> Self {
        Self {
            url: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            content_type: default_content_type(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_defaults_from_empty_json() {
        let settings: PusherSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, PusherSettings::default());
        assert_eq!(settings.target.request_timeout, Duration::from_secs(5));
        assert_eq!(settings.target.content_type, DEFAULT_CONTENT_TYPE);
    }

    #[test]
    fn test_validate_rejects_malformed_url() {
        let settings = PusherSettings {
            target: TargetSettings {
                url: Some("not a url".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_capacity() {
        let settings = PusherSettings {
            pipeline: PipelineConfig {
                queue_capacity: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }
}
