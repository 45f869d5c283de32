//! Dispatcher - rate gate and concurrent fan-out to the delivery target

use std::sync::Arc;
use std::time::Duration;

use async_channel::Receiver;
use contracts::{CancellationToken, DeliveryTarget, Message, PipelineConfig, PushError};
use tokio::sync::{mpsc, OwnedSemaphorePermit, Semaphore};
use tokio::task::{JoinError, JoinSet};
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{debug, error, info, instrument};

use crate::metrics::DispatchMetrics;
use crate::task::{deliver_message, TaskContext};

/// Releases at most one admission per interval
///
/// The first tick is immediate. Missed ticks are delayed rather than
/// bursted, so two admissions are never closer than `interval`.
struct RateGate {
    ticker: Option<Interval>,
}

impl RateGate {
    fn new(interval: Duration) -> Self {
        // zero interval: no timer at all (tokio intervals reject a zero period)
        let ticker = (!interval.is_zero()).then(|| {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker
        });
        Self { ticker }
    }

    /// Wait for the next tick. Returns false if cancelled first.
    async fn admit(&mut self, cancel: &CancellationToken) -> bool {
        match self.ticker.as_mut() {
            Some(ticker) => tokio::select! {
                biased;
                () = cancel.cancelled() => false,
                _ = ticker.tick() => true,
            },
            None => !cancel.is_cancelled(),
        }
    }
}

/// The dispatcher that admits messages and fans them out to the target
pub struct Dispatcher<T> {
    target: Arc<T>,
    config: Arc<PipelineConfig>,
    input_rx: Receiver<Message>,
    cancel: CancellationToken,
    metrics: Arc<DispatchMetrics>,
}

impl<T> Dispatcher<T>
where
    T: DeliveryTarget + Sync + 'static,
{
    /// Create a new dispatcher reading from `input_rx`
    pub fn new(
        target: Arc<T>,
        config: Arc<PipelineConfig>,
        input_rx: Receiver<Message>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            target,
            config,
            input_rx,
            cancel,
            metrics: Arc::new(DispatchMetrics::new()),
        }
    }

    /// Share an existing metrics instance
    pub fn with_metrics(mut self, metrics: Arc<DispatchMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Get metrics reference
    pub fn metrics(&self) -> Arc<DispatchMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Spawn the dispatcher as a background task
    ///
    /// The returned receiver yields one `PushError::Delivery` per failed
    /// delivery and closes once every launched task has finished.
    pub fn spawn(self) -> mpsc::UnboundedReceiver<PushError> {
        let (err_tx, err_rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            self.run(err_tx).await;
        });
        err_rx
    }

    /// Run the dispatcher main loop
    ///
    /// Returns after the input closed (or cancellation stopped admission)
    /// and all launched deliveries completed. `err_tx` and every clone held
    /// by the tasks are dropped by then, which closes the error output.
    #[instrument(
        name = "dispatcher_run",
        skip_all,
        fields(target_name = %self.target.name())
    )]
    pub async fn run(self, err_tx: mpsc::UnboundedSender<PushError>) {
        let Self {
            target,
            config,
            input_rx,
            cancel,
            metrics,
        } = self;

        info!(
            interval_us = config.interval.as_micros() as u64,
            max_in_flight = ?config.max_in_flight,
            "Dispatcher started"
        );

        let mut gate = RateGate::new(config.interval);
        let slots = config.max_in_flight.map(|n| Arc::new(Semaphore::new(n)));
        let ctx = TaskContext {
            target,
            cancel: cancel.clone(),
            metrics: Arc::clone(&metrics),
            errors: err_tx,
        };
        let mut tasks = JoinSet::new();

        loop {
            let message = tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                received = input_rx.recv() => match received {
                    Ok(message) => message,
                    Err(_) => break,
                },
            };

            if config.skip_empty_lines && message.is_empty() {
                metrics.inc_skipped_count();
                if config.verbose {
                    info!(line = message.line, "skip_empty_lines");
                }
                continue;
            }

            if !gate.admit(&cancel).await {
                debug!(line = message.line, "Cancelled before admission");
                break;
            }

            let permit = match &slots {
                Some(slots) => match acquire_slot(slots, &cancel).await {
                    Some(permit) => Some(permit),
                    None => break,
                },
                None => None,
            };

            metrics.inc_admitted_count();
            tasks.spawn(deliver_message(ctx.clone(), message, permit));

            // reap finished deliveries so the set tracks only live tasks
            while let Some(joined) = tasks.try_join_next() {
                log_join_result(joined);
            }
        }

        // stop the feeder from waiting on a queue nobody drains
        input_rx.close();
        drop(ctx);

        debug!(in_flight = tasks.len(), "Admission stopped, draining deliveries");
        while let Some(joined) = tasks.join_next().await {
            log_join_result(joined);
        }

        let snapshot = metrics.snapshot();
        info!(
            admitted = snapshot.admitted_count,
            skipped = snapshot.skipped_count,
            delivered = snapshot.delivered_count,
            failed = snapshot.failure_count,
            cancelled = cancel.is_cancelled(),
            "Dispatcher shutdown complete"
        );
    }
}

/// Wait for a free concurrency slot, or None if cancelled first
async fn acquire_slot(
    slots: &Arc<Semaphore>,
    cancel: &CancellationToken,
) -> Option<OwnedSemaphorePermit> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => None,
        permit = Arc::clone(slots).acquire_owned() => permit.ok(),
    }
}

fn log_join_result(joined: Result<(), JoinError>) {
    if let Err(e) = joined {
        error!(error = ?e, "Delivery task panicked");
    }
}
