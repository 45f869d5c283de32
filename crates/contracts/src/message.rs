//! Message - Feeder output
//!
//! One line of input, the atomic unit of delivery work.

use std::borrow::Cow;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// A single line of input with its terminator stripped.
///
/// The only identity a message carries is its position in the input.
/// Payload bytes are reference counted, so cloning is cheap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// 1-based line number in the input stream
    pub line: u64,

    /// Raw line content (no `\n`, no trailing `\r`)
    pub payload: Bytes,
}

impl Message {
    /// Create a message from a line number and payload
    pub fn new(line: u64, payload: impl Into<Bytes>) -> Self {
        Self {
            line,
            payload: payload.into(),
        }
    }

    /// Payload length in bytes
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// True for zero-length lines
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Payload rendered as text, invalid UTF-8 replaced
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }
}
