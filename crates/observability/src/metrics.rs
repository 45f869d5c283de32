//! Pipeline metrics
//!
//! Thin wrappers over the `metrics` macros so every stage records under the
//! same names. Without an installed recorder these calls are no-ops.

use metrics::{counter, gauge, histogram};

/// Record one line scanned by the feeder
pub fn record_line_read(bytes: usize) {
    counter!("pusher_lines_read_total").increment(1);
    counter!("pusher_bytes_read_total").increment(bytes as u64);
}

/// Record an input stream failure
pub fn record_read_error() {
    counter!("pusher_read_errors_total").increment(1);
}

/// Record a message released by the rate gate
pub fn record_message_admitted() {
    counter!("pusher_messages_admitted_total").increment(1);
}

/// Record an empty line suppressed by the skip policy
pub fn record_message_skipped() {
    counter!("pusher_messages_skipped_total").increment(1);
}

/// Record the outcome of one delivery
pub fn record_delivery(target: &str, success: bool, latency_ms: f64) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "pusher_deliveries_total",
        "target" => target.to_string(),
        "status" => status
    )
    .increment(1);
    histogram!("pusher_delivery_latency_ms", "target" => target.to_string()).record(latency_ms);
}

/// Record the number of deliveries currently running
pub fn record_in_flight(in_flight: usize) {
    gauge!("pusher_deliveries_in_flight").set(in_flight as f64);
}
