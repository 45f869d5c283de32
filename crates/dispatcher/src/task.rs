//! Delivery task - one per admitted message

use std::sync::Arc;
use std::time::Instant;

use contracts::{CancellationToken, DeliveryTarget, Message, PushError};
use tokio::sync::{mpsc, OwnedSemaphorePermit};
use tracing::{debug, instrument, warn};

use crate::metrics::DispatchMetrics;

/// Everything a delivery task needs besides its message
pub(crate) struct TaskContext<T> {
    pub target: Arc<T>,
    pub cancel: CancellationToken,
    pub metrics: Arc<DispatchMetrics>,
    pub errors: mpsc::UnboundedSender<PushError>,
}

impl<T> Clone for TaskContext<T> {
    fn clone(&self) -> Self {
        Self {
            target: Arc::clone(&self.target),
            cancel: self.cancel.clone(),
            metrics: Arc::clone(&self.metrics),
            errors: self.errors.clone(),
        }
    }
}

/// Deliver one message and report a failure on the shared error channel
///
/// Invokes the target exactly once. The optional permit is held until the
/// delivery finishes.
#[instrument(
    name = "delivery_task",
    skip(ctx, message, _permit),
    fields(line = message.line)
)]
pub(crate) async fn deliver_message<T>(
    ctx: TaskContext<T>,
    message: Message,
    _permit: Option<OwnedSemaphorePermit>,
) where
    T: DeliveryTarget + Sync + 'static,
{
    let name = ctx.target.name();

    ctx.metrics.task_started();
    let started = Instant::now();
    let result = ctx.target.deliver(&message, &ctx.cancel).await;
    let latency = started.elapsed();
    ctx.metrics.task_finished(name, result.is_ok(), latency);

    match result {
        Ok(()) => {
            debug!(
                target_name = %name,
                latency_ms = latency.as_millis() as u64,
                "Delivered"
            );
        }
        Err(cause) => {
            warn!(target_name = %name, error = %cause, "Delivery failed");
            if ctx.errors.send(PushError::delivery(message, cause)).is_err() {
                debug!("Error output dropped by consumer");
            }
        }
    }
}
