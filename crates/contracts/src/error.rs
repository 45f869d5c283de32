//! Layered error definitions
//!
//! Categorized by source: config / delivery / pipeline

use bytes::Bytes;
use thiserror::Error;

/// Configuration error
#[derive(Debug, Error)]
pub enum ContractError {
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Failure reported by a `DeliveryTarget` for a single message
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// Connection or protocol level failure
    #[error("transport error: {message}")]
    Transport { message: String },

    /// Request did not complete within the target's timeout
    #[error("request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// Endpoint answered with a status outside the accepted set
    #[error("http return status code {status_code}")]
    Status { status_code: u16 },

    /// Shared cancellation fired while the delivery was in flight
    #[error("delivery cancelled")]
    Cancelled,

    /// Target cannot address the endpoint (bad URL, client setup)
    #[error("invalid target: {message}")]
    InvalidTarget { message: String },

    /// Target specific failure
    #[error("{message}")]
    Other { message: String },
}

impl DeliveryError {
    /// Create transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create status error
    pub fn status(status_code: u16) -> Self {
        Self::Status { status_code }
    }

    /// Create invalid target error
    pub fn invalid_target(message: impl Into<String>) -> Self {
        Self::InvalidTarget {
            message: message.into(),
        }
    }

    /// Create target specific error
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }
}

/// Item of the caller-visible error stream
///
/// Two origins merge into one stream: the feeder (at most one `Read`) and
/// the delivery tasks (one `Delivery` per failed message).
#[derive(Debug, Error)]
pub enum PushError {
    /// Input stream could not be fully consumed
    #[error("read error after line {line}: {source}")]
    Read {
        /// Last line successfully scanned before the failure
        line: u64,
        #[source]
        source: std::io::Error,
    },

    /// One message could not be delivered
    #[error("delivery of line {line} failed: {cause}")]
    Delivery {
        line: u64,
        /// The message content that failed
        payload: Bytes,
        #[source]
        cause: DeliveryError,
    },
}

impl PushError {
    /// Create read error
    pub fn read(line: u64, source: std::io::Error) -> Self {
        Self::Read { line, source }
    }

    /// Create delivery error carrying the failed message
    pub fn delivery(message: crate::Message, cause: DeliveryError) -> Self {
        Self::Delivery {
            line: message.line,
            payload: message.payload,
            cause,
        }
    }

    /// True for per-message delivery failures
    pub fn is_delivery(&self) -> bool {
        matches!(self, Self::Delivery { .. })
    }

    /// Payload of the failed message, if this is a delivery failure
    pub fn payload(&self) -> Option<&Bytes> {
        match self {
            Self::Delivery { payload, .. } => Some(payload),
            Self::Read { .. } => None,
        }
    }
}
