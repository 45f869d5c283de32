//! Feeder metrics

use std::sync::atomic::{AtomicU64, Ordering};

/// Feeder counters
#[derive(Debug, Default)]
pub struct FeedMetrics {
    /// Total lines scanned
    lines_read: AtomicU64,

    /// Total payload bytes scanned (terminators excluded)
    bytes_read: AtomicU64,

    /// Read failures (0 or 1 per run)
    read_errors: AtomicU64,
}

impl FeedMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one scanned line
    pub fn record_line(&self, len: usize) {
        self.lines_read.fetch_add(1, Ordering::Relaxed);
        self.bytes_read.fetch_add(len as u64, Ordering::Relaxed);
        observability::record_line_read(len);
    }

    /// Record a read failure
    pub fn record_read_error(&self) {
        self.read_errors.fetch_add(1, Ordering::Relaxed);
        observability::record_read_error();
    }

    /// Get snapshot
    pub fn snapshot(&self) -> FeedSnapshot {
        FeedSnapshot {
            lines_read: self.lines_read.load(Ordering::Relaxed),
            bytes_read: self.bytes_read.load(Ordering::Relaxed),
            read_errors: self.read_errors.load(Ordering::Relaxed),
        }
    }
}

/// Metrics snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedSnapshot {
    pub lines_read: u64,
    pub bytes_read: u64,
    pub read_errors: u64,
}
