//! Push pipeline: feeder -> dispatcher -> merged error stream

use std::sync::Arc;

use contracts::{CancellationToken, DeliveryTarget, PipelineConfig, PushError};
use feeder::{FeedMetrics, Feeder};
use tokio::io::AsyncRead;
use tokio::sync::mpsc;
use tracing::info;

use crate::dispatcher::Dispatcher;
use crate::merge::merge;
use crate::metrics::DispatchMetrics;

/// A wired-up pipeline, ready to spawn
///
/// Holds the metrics of both stages so the caller can report on the run
/// after the error stream has closed.
pub struct PushPipeline<R, T> {
    feeder: Feeder<R>,
    target: Arc<T>,
    config: Arc<PipelineConfig>,
    cancel: CancellationToken,
    dispatch_metrics: Arc<DispatchMetrics>,
}

impl<R, T> PushPipeline<R, T>
where
    R: AsyncRead + Unpin + Send + 'static,
    T: DeliveryTarget + Sync + 'static,
{
    pub fn new(
        input: R,
        target: Arc<T>,
        config: Arc<PipelineConfig>,
        cancel: CancellationToken,
    ) -> Self {
        let feeder = Feeder::new(input, Arc::clone(&config), cancel.clone());
        Self {
            feeder,
            target,
            config,
            cancel,
            dispatch_metrics: Arc::new(DispatchMetrics::new()),
        }
    }

    pub fn feed_metrics(&self) -> Arc<FeedMetrics> {
        self.feeder.metrics()
    }

    pub fn dispatch_metrics(&self) -> Arc<DispatchMetrics> {
        Arc::clone(&self.dispatch_metrics)
    }

    /// Start both stages and return the merged error stream
    ///
    /// The stream closes once the feeder has stopped and every admitted
    /// delivery has completed.
    pub fn spawn(self) -> mpsc::UnboundedReceiver<PushError> {
        info!(
            target_name = %self.target.name(),
            interval_us = self.config.interval.as_micros() as u64,
            queue_capacity = self.config.effective_queue_capacity(),
            skip_empty_lines = self.config.skip_empty_lines,
            "Starting push pipeline"
        );

        let feed = self.feeder.spawn();
        let dispatch_errors = Dispatcher::new(self.target, self.config, feed.messages, self.cancel)
            .with_metrics(self.dispatch_metrics)
            .spawn();

        merge([feed.errors, dispatch_errors])
    }
}

/// Push every line of `input` to `target`
///
/// Convenience over [`PushPipeline`] when stage metrics are not needed.
pub fn push<R, T>(
    input: R,
    target: Arc<T>,
    config: Arc<PipelineConfig>,
    cancel: CancellationToken,
) -> mpsc::UnboundedReceiver<PushError>
where
    R: AsyncRead + Unpin + Send + 'static,
    T: DeliveryTarget + Sync + 'static,
{
    PushPipeline::new(input, target, config, cancel).spawn()
}
