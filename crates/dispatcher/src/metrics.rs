//! Dispatch metrics for observability

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

/// Metrics for one dispatcher run
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    /// Messages released by the rate gate
    admitted_count: AtomicU64,
    /// Empty lines suppressed before admission
    skipped_count: AtomicU64,
    /// Successful deliveries
    delivered_count: AtomicU64,
    /// Failed deliveries
    failure_count: AtomicU64,
    /// Deliveries currently running
    in_flight: AtomicUsize,
    /// Highest observed `in_flight`
    peak_in_flight: AtomicUsize,
    /// Sum of delivery latencies
    latency_total_us: AtomicU64,
}

impl DispatchMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment admitted count
    pub fn inc_admitted_count(&self) {
        self.admitted_count.fetch_add(1, Ordering::Relaxed);
        observability::record_message_admitted();
    }

    /// Increment skipped count
    pub fn inc_skipped_count(&self) {
        self.skipped_count.fetch_add(1, Ordering::Relaxed);
        observability::record_message_skipped();
    }

    /// Mark a delivery task as running
    pub fn task_started(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::Relaxed) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::Relaxed);
        observability::record_in_flight(now);
    }

    /// Mark a delivery task as finished and record its outcome
    pub fn task_finished(&self, target: &str, success: bool, latency: Duration) {
        let now = self.in_flight.fetch_sub(1, Ordering::Relaxed).saturating_sub(1);
        observability::record_in_flight(now);

        if success {
            self.delivered_count.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failure_count.fetch_add(1, Ordering::Relaxed);
        }
        self.latency_total_us
            .fetch_add(latency.as_micros() as u64, Ordering::Relaxed);
        observability::record_delivery(target, success, latency.as_secs_f64() * 1000.0);
    }

    /// Get admitted count
    pub fn admitted_count(&self) -> u64 {
        self.admitted_count.load(Ordering::Relaxed)
    }

    /// Get current in-flight deliveries
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Relaxed)
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> DispatchSnapshot {
        let delivered_count = self.delivered_count.load(Ordering::Relaxed);
        let failure_count = self.failure_count.load(Ordering::Relaxed);
        let finished = delivered_count + failure_count;
        let mean_latency = if finished > 0 {
            Duration::from_micros(self.latency_total_us.load(Ordering::Relaxed) / finished)
        } else {
            Duration::ZERO
        };

        DispatchSnapshot {
            admitted_count: self.admitted_count(),
            skipped_count: self.skipped_count.load(Ordering::Relaxed),
            delivered_count,
            failure_count,
            in_flight: self.in_flight(),
            peak_in_flight: self.peak_in_flight.load(Ordering::Relaxed),
            mean_latency,
        }
    }
}

/// Snapshot of dispatch metrics (for reporting)
#[derive(Debug, Clone, Copy, Default)]
pub struct DispatchSnapshot {
    pub admitted_count: u64,
    pub skipped_count: u64,
    pub delivered_count: u64,
    pub failure_count: u64,
    pub in_flight: usize,
    pub peak_in_flight: usize,
    pub mean_latency: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_flight_tracking() {
        let metrics = DispatchMetrics::new();
        metrics.task_started();
        metrics.task_started();
        assert_eq!(metrics.in_flight(), 2);

        metrics.task_finished("t", true, Duration::from_millis(10));
        metrics.task_finished("t", false, Duration::from_millis(30));

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.in_flight, 0);
        assert_eq!(snapshot.peak_in_flight, 2);
        assert_eq!(snapshot.delivered_count, 1);
        assert_eq!(snapshot.failure_count, 1);
        assert_eq!(snapshot.mean_latency, Duration::from_millis(20));
    }
}
