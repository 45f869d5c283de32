//! Pipeline configuration contracts shared by the feeder and the dispatcher.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

/// Default minimum time between two admissions
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(1);

/// Default bound of the feeder -> dispatcher queue
pub const DEFAULT_QUEUE_CAPACITY: usize = 10;

/// Default longest accepted input line (bytes, terminator excluded)
pub const DEFAULT_MAX_LINE_LENGTH: usize = 64 * 1024;

/// Pipeline configuration
///
/// Immutable for the lifetime of one run and shared as `Arc<PipelineConfig>`
/// by every component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct PipelineConfig {
    /// Trace every fed line and every skip decision
    #[serde(default)]
    pub verbose: bool,

    /// Never hand zero-length lines to the delivery target
    #[serde(default)]
    pub skip_empty_lines: bool,

    /// Minimum interval between admissions (zero disables rate limiting)
    #[serde(with = "humantime_serde", default = "default_interval")]
    pub interval: Duration,

    /// Capacity of the bounded message queue (backpressure on the feeder)
    #[serde(default = "default_queue_capacity")]
    #[validate(range(min = 1))]
    pub queue_capacity: usize,

    /// Lines longer than this are reported as read failures
    #[serde(default = "default_max_line_length")]
    #[validate(range(min = 1))]
    pub max_line_length: usize,

    /// Optional cap on concurrently running deliveries (None = unbounded)
    #[serde(default)]
    #[validate(range(min = 1))]
    pub max_in_flight: Option<usize>,
}

fn default_interval() -> Duration {
    DEFAULT_INTERVAL
}

fn default_queue_capacity() -> usize {
    DEFAULT_QUEUE_CAPACITY
}

fn default_max_line_length() -> usize {
    DEFAULT_MAX_LINE_LENGTH
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            skip_empty_lines: false,
            interval: DEFAULT_INTERVAL,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            max_in_flight: None,
        }
    }
}

impl PipelineConfig {
    /// Set the admission interval
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Enable or disable verbose tracing
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Enable or disable the empty line skip
    pub fn with_skip_empty_lines(mut self, skip: bool) -> Self {
        self.skip_empty_lines = skip;
        self
    }

    /// Cap concurrent deliveries
    pub fn with_max_in_flight(mut self, max_in_flight: Option<usize>) -> Self {
        self.max_in_flight = max_in_flight;
        self
    }

    /// Queue capacity, never below one slot
    pub fn effective_queue_capacity(&self) -> usize {
        self.queue_capacity.max(1)
    }
}
