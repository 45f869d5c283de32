//! Feeder task: input stream -> bounded message queue

use std::sync::Arc;

use async_channel::{bounded, Receiver, Sender};
use contracts::{CancellationToken, Message, PipelineConfig, PushError};
use tokio::io::AsyncRead;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

use crate::lines::LineReader;
use crate::metrics::FeedMetrics;

/// Channels handed to the downstream stages
///
/// Both close when the feeder stops: on end of input, on a read failure, or
/// on cancellation. `errors` yields at most one `PushError::Read`.
pub struct FeedOutput {
    /// Ordered messages, bounded by `PipelineConfig::queue_capacity`
    pub messages: Receiver<Message>,

    /// Feeder error output
    pub errors: mpsc::UnboundedReceiver<PushError>,
}

/// Line feeder
pub struct Feeder<R> {
    reader: R,
    config: Arc<PipelineConfig>,
    cancel: CancellationToken,
    metrics: Arc<FeedMetrics>,
}

impl<R> Feeder<R>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    /// Create a new feeder over `reader`
    pub fn new(reader: R, config: Arc<PipelineConfig>, cancel: CancellationToken) -> Self {
        Self {
            reader,
            config,
            cancel,
            metrics: Arc::new(FeedMetrics::new()),
        }
    }

    /// Get metrics reference
    pub fn metrics(&self) -> Arc<FeedMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Spawn the feeder as a background task
    pub fn spawn(self) -> FeedOutput {
        let (tx, rx) = bounded(self.config.effective_queue_capacity());
        let (err_tx, err_rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            self.run(tx, err_tx).await;
        });

        FeedOutput {
            messages: rx,
            errors: err_rx,
        }
    }

    /// Feed lines until end of input, read failure or cancellation
    ///
    /// Owns the only senders of both outputs; dropping them on return is
    /// what closes the channels.
    #[instrument(name = "feeder_run", skip_all)]
    async fn run(self, tx: Sender<Message>, err_tx: mpsc::UnboundedSender<PushError>) {
        let Self {
            reader,
            config,
            cancel,
            metrics,
        } = self;

        debug!(capacity = ?tx.capacity(), "Feeder started");
        let mut lines = LineReader::new(reader, config.max_line_length);

        loop {
            let next = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    debug!(line = lines.line(), "Feeder cancelled while reading");
                    break;
                }
                next = lines.next_line() => next,
            };

            let payload = match next {
                Ok(Some(payload)) => payload,
                Ok(None) => break,
                Err(e) => {
                    metrics.record_read_error();
                    warn!(line = lines.line(), error = %e, "Input read failed");
                    if err_tx.send(PushError::read(lines.line(), e)).is_err() {
                        debug!("Error output dropped by consumer");
                    }
                    break;
                }
            };

            let message = Message::new(lines.line(), payload);
            metrics.record_line(message.len());

            if config.verbose {
                info!(line = message.line, content = %message.text(), "line");
            }

            // cancellation wins over a free queue slot; the scanned line is discarded
            let line = message.line;
            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    debug!(line, "Feeder cancelled, line discarded");
                    break;
                }
                sent = tx.send(message) => {
                    if sent.is_err() {
                        debug!("Message queue closed by consumer");
                        break;
                    }
                }
            }
        }

        debug!(lines = lines.line(), "Feeder stopped");
    }
}
