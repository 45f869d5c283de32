//! Run statistics and summary.

use std::time::Duration;

use contracts::PushError;
use dispatcher::DispatchSnapshot;
use feeder::FeedSnapshot;

/// Statistics from one pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Errors received on the merged stream
    pub errors: u64,

    /// Of which read failures (0 or 1)
    pub read_errors: u64,

    /// Of which delivery failures
    pub delivery_errors: u64,

    /// Why the run was cancelled, if it was
    pub abort_reason: Option<&'static str>,

    /// Total duration of the run
    pub duration: Duration,

    /// Feeder counters at the end of the run
    pub feed: FeedSnapshot,

    /// Dispatcher counters at the end of the run
    pub dispatch: DispatchSnapshot,
}

impl PipelineStats {
    /// Count one error from the merged stream
    pub fn record_error(&mut self, err: &PushError) {
        self.errors += 1;
        if err.is_delivery() {
            self.delivery_errors += 1;
        } else {
            self.read_errors += 1;
        }
    }

    /// Ran to completion without a single error
    pub fn is_clean(&self) -> bool {
        self.errors == 0 && self.abort_reason.is_none()
    }

    /// Admitted messages per second
    pub fn rate(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.dispatch.admitted_count as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n=== Pipeline Statistics ===\n");

        println!("Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Lines read: {}", self.feed.lines_read);
        println!("   ├─ Bytes read: {}", self.feed.bytes_read);
        println!("   ├─ Admitted: {}", self.dispatch.admitted_count);
        println!("   ├─ Skipped (empty): {}", self.dispatch.skipped_count);
        println!("   └─ Rate: {:.2} msg/s", self.rate());

        println!("\nDelivery");
        println!("   ├─ Delivered: {}", self.dispatch.delivered_count);
        println!("   ├─ Failed: {}", self.dispatch.failure_count);
        println!("   ├─ Peak in flight: {}", self.dispatch.peak_in_flight);
        println!(
            "   └─ Mean latency: {:.2}ms",
            self.dispatch.mean_latency.as_secs_f64() * 1000.0
        );

        println!("\nErrors");
        println!("   ├─ Read: {}", self.read_errors);
        println!("   └─ Delivery: {}", self.delivery_errors);

        if let Some(reason) = self.abort_reason {
            println!("\nAborted: {reason}");
        }

        println!();
    }
}
