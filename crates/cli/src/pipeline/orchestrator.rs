//! Pipeline orchestrator - wires target, push pipeline and shutdown.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use contracts::{CancellationToken, DeliveryTarget, PusherSettings, PushError};
use dispatcher::{HttpTarget, HttpTargetConfig, LogTarget, PushPipeline};
use tokio::io::AsyncRead;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::PipelineStats;
use crate::error::CliError;

/// Options for one run
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Validated settings (file + flags)
    pub settings: PusherSettings,

    /// Abort the run after this long (None = no deadline)
    pub deadline: Option<Duration>,

    /// Log lines instead of delivering them
    pub dry_run: bool,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    options: PipelineOptions,
}

impl Pipeline {
    /// Create a new pipeline with the given options
    pub fn new(options: PipelineOptions) -> Self {
        Self { options }
    }

    /// Run the pipeline over `input` until its error stream closes
    pub async fn run<R>(self, input: R) -> Result<PipelineStats>
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        if let Some(port) = self.options.settings.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        if self.options.dry_run {
            info!("Running in DRY-RUN mode (lines are logged, not sent)");
            let target = Arc::new(LogTarget::new("dry-run"));
            return self.drive(input, target).await;
        }

        let target = Arc::new(self.build_http_target()?);
        info!(url = %target.url(), "Delivering to HTTP target");
        self.drive(input, target).await
    }

    fn build_http_target(&self) -> Result<HttpTarget, CliError> {
        let settings = &self.options.settings;
        let url = settings.target.url.clone().ok_or(CliError::MissingTarget)?;

        let mut config = HttpTargetConfig::new(url)
            .with_timeout(settings.target.request_timeout)
            .with_verbose(settings.pipeline.verbose);
        config.content_type = settings.target.content_type.clone();

        Ok(HttpTarget::new(config)?)
    }

    async fn drive<R, T>(self, input: R, target: Arc<T>) -> Result<PipelineStats>
    where
        R: AsyncRead + Unpin + Send + 'static,
        T: DeliveryTarget + Sync + 'static,
    {
        let start_time = Instant::now();
        let cancel = CancellationToken::new();
        let finished = CancellationToken::new();
        let watcher = watch_shutdown(cancel.clone(), finished.clone(), self.options.deadline);

        let config = Arc::new(self.options.settings.pipeline.clone());
        let pipeline = PushPipeline::new(input, target, config, cancel.clone());
        let feed_metrics = pipeline.feed_metrics();
        let dispatch_metrics = pipeline.dispatch_metrics();

        let mut errors = pipeline.spawn();
        let mut stats = PipelineStats::default();

        while let Some(err) = errors.recv().await {
            report(&err);
            stats.record_error(&err);
        }

        finished.cancel();
        stats.abort_reason = match watcher.await {
            Ok(reason) => reason,
            Err(e) => {
                warn!(error = %e, "Shutdown watcher failed");
                cancel.is_cancelled().then_some("cancelled")
            }
        };
        stats.duration = start_time.elapsed();
        stats.feed = feed_metrics.snapshot();
        stats.dispatch = dispatch_metrics.snapshot();

        match stats.abort_reason {
            Some(reason) => warn!("ABORTED ({reason}) with {} errors", stats.errors),
            None if stats.errors > 0 => warn!("DONE with {} errors", stats.errors),
            None => info!("DONE"),
        }

        Ok(stats)
    }
}

/// Log one error from the merged stream
fn report(err: &PushError) {
    match err {
        PushError::Delivery {
            line,
            payload,
            cause,
        } => error!(
            line,
            payload = %String::from_utf8_lossy(payload),
            error = %cause,
            "Delivery failed"
        ),
        PushError::Read { line, source } => error!(line, error = %source, "Input read failed"),
    }
}

/// Cancel the run on Ctrl+C, SIGTERM or deadline
///
/// Resolves to the abort reason, or None once `finished` fires first.
fn watch_shutdown(
    cancel: CancellationToken,
    finished: CancellationToken,
    deadline: Option<Duration>,
) -> JoinHandle<Option<&'static str>> {
    tokio::spawn(async move {
        let deadline = async {
            match deadline {
                Some(after) => tokio::time::sleep(after).await,
                None => std::future::pending().await,
            }
        };

        let reason = tokio::select! {
            biased;
            () = finished.cancelled() => return None,
            () = shutdown_signal() => "signal",
            () = deadline => "deadline exceeded",
        };

        warn!(reason, "Stopping pipeline");
        cancel.cancel();
        Some(reason)
    })
}

/// Resolves on Ctrl+C or SIGTERM; never resolves if no handler can be installed
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
