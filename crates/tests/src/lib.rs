//! # Integration Tests
//!
//! Cross-crate and end-to-end tests.
//!
//! Covers:
//! - settings -> pipeline wiring
//! - end-to-end push scenarios with in-process targets
//! - HTTP delivery against a mock server

#[cfg(test)]
mod support {
    use std::io;
    use std::pin::Pin;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;
    use std::task::{Context, Poll};
    use std::time::Duration;

    use contracts::{CancellationToken, DeliveryError, DeliveryTarget, Message, PushError};
    use tokio::io::{AsyncRead, ReadBuf};
    use tokio::sync::mpsc;

    /// Records every payload it is asked to deliver
    #[derive(Default)]
    pub struct CountingTarget {
        pub calls: AtomicU64,
        pub payloads: Mutex<Vec<String>>,
    }

    impl CountingTarget {
        pub fn calls(&self) -> u64 {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn sorted_payloads(&self) -> Vec<String> {
            let mut payloads = self.payloads.lock().unwrap().clone();
            payloads.sort();
            payloads
        }
    }

    impl DeliveryTarget for CountingTarget {
        fn name(&self) -> &str {
            "counting"
        }

        async fn deliver(
            &self,
            message: &Message,
            _cancel: &CancellationToken,
        ) -> Result<(), DeliveryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.payloads
                .lock()
                .unwrap()
                .push(message.text().into_owned());
            Ok(())
        }
    }

    /// Rejects every message
    #[derive(Default)]
    pub struct FailingTarget {
        pub calls: AtomicU64,
    }

    impl DeliveryTarget for FailingTarget {
        fn name(&self) -> &str {
            "failing"
        }

        async fn deliver(
            &self,
            _message: &Message,
            _cancel: &CancellationToken,
        ) -> Result<(), DeliveryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(DeliveryError::status(503))
        }
    }

    /// Takes `delay` per message unless cancelled
    pub struct SlowTarget {
        pub calls: AtomicU64,
        pub delay: Duration,
    }

    impl SlowTarget {
        pub fn new(delay: Duration) -> Self {
            Self {
                calls: AtomicU64::new(0),
                delay,
            }
        }
    }

    impl DeliveryTarget for SlowTarget {
        fn name(&self) -> &str {
            "slow"
        }

        async fn deliver(
            &self,
            _message: &Message,
            cancel: &CancellationToken,
        ) -> Result<(), DeliveryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::select! {
                () = cancel.cancelled() => Err(DeliveryError::Cancelled),
                () = tokio::time::sleep(self.delay) => Ok(()),
            }
        }
    }

    /// Yields `prefix`, then fails every further read
    pub struct BrokenStream {
        prefix: Option<&'static [u8]>,
    }

    impl BrokenStream {
        pub fn after(prefix: &'static [u8]) -> Self {
            Self {
                prefix: Some(prefix),
            }
        }
    }

    impl AsyncRead for BrokenStream {
        fn poll_read(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            match self.prefix.take() {
                Some(prefix) => {
                    buf.put_slice(prefix);
                    Poll::Ready(Ok(()))
                }
                None => Poll::Ready(Err(io::Error::new(
                    io::ErrorKind::ConnectionReset,
                    "stream reset",
                ))),
            }
        }
    }

    /// Drain the error stream, failing the test if it does not close in time
    pub async fn drain(mut errors: mpsc::UnboundedReceiver<PushError>) -> Vec<PushError> {
        tokio::time::timeout(Duration::from_secs(5), async move {
            let mut collected = Vec::new();
            while let Some(err) = errors.recv().await {
                collected.push(err);
            }
            collected
        })
        .await
        .expect("error stream did not close")
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use contracts::{CancellationToken, PipelineConfig, PushError};
    use dispatcher::{push, PushPipeline};

    use crate::support::*;

    fn fast() -> Arc<PipelineConfig> {
        Arc::new(PipelineConfig::default().with_interval(Duration::from_micros(1)))
    }

    #[tokio::test]
    async fn test_all_lines_delivered_without_errors() {
        let target = Arc::new(CountingTarget::default());

        let errors = drain(push(
            &b"a\nb"[..],
            Arc::clone(&target),
            fast(),
            CancellationToken::new(),
        ))
        .await;

        assert!(errors.is_empty());
        assert_eq!(target.calls(), 2);
        assert_eq!(target.sorted_payloads(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_skip_empty_lines_end_to_end() {
        let target = Arc::new(CountingTarget::default());
        let config = Arc::new(
            PipelineConfig::default()
                .with_interval(Duration::from_micros(1))
                .with_skip_empty_lines(true),
        );

        let errors = drain(push(
            &b"x\n\ny"[..],
            Arc::clone(&target),
            config,
            CancellationToken::new(),
        ))
        .await;

        assert!(errors.is_empty());
        assert_eq!(target.calls(), 2);
        assert_eq!(target.sorted_payloads(), vec!["x", "y"]);
    }

    #[tokio::test]
    async fn test_empty_lines_reach_target_when_not_skipped() {
        let target = Arc::new(CountingTarget::default());

        drain(push(
            &b"x\n\ny\n"[..],
            Arc::clone(&target),
            fast(),
            CancellationToken::new(),
        ))
        .await;

        assert_eq!(target.sorted_payloads(), vec!["", "x", "y"]);
    }

    #[tokio::test]
    async fn test_stream_failure_reports_one_read_error() {
        let target = Arc::new(CountingTarget::default());

        let errors = drain(push(
            BrokenStream::after(b"one\n"),
            Arc::clone(&target),
            fast(),
            CancellationToken::new(),
        ))
        .await;

        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], PushError::Read { line: 1, .. }));
        assert_eq!(target.sorted_payloads(), vec!["one"]);
    }

    #[tokio::test]
    async fn test_every_failure_echoes_its_message() {
        let target = Arc::new(FailingTarget::default());

        let errors = drain(push(
            &b"l1\nl2\nl3\n"[..],
            Arc::clone(&target),
            fast(),
            CancellationToken::new(),
        ))
        .await;

        assert_eq!(errors.len(), 3);
        assert!(errors.iter().all(PushError::is_delivery));

        let mut echoed: Vec<_> = errors
            .iter()
            .map(|e| match e {
                PushError::Delivery { line, payload, .. } => {
                    (*line, String::from_utf8_lossy(payload).into_owned())
                }
                other => panic!("unexpected error: {other}"),
            })
            .collect();
        echoed.sort();
        assert_eq!(
            echoed,
            vec![
                (1, "l1".to_string()),
                (2, "l2".to_string()),
                (3, "l3".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let target = Arc::new(CountingTarget::default());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let errors = drain(push(
            &b"a\nb\nc\n"[..],
            Arc::clone(&target),
            fast(),
            cancel,
        ))
        .await;

        assert!(errors.is_empty());
        assert_eq!(target.calls(), 0);
    }

    #[tokio::test]
    async fn test_cancel_mid_stream_stops_admission() {
        let input: &'static [u8] = Box::leak("line\n".repeat(100).into_bytes().into_boxed_slice());
        let target = Arc::new(SlowTarget::new(Duration::from_secs(10)));
        let cancel = CancellationToken::new();
        let config = Arc::new(PipelineConfig::default().with_interval(Duration::from_millis(10)));

        let pipeline = PushPipeline::new(input, Arc::clone(&target), config, cancel.clone());
        let metrics = pipeline.dispatch_metrics();
        let errors = pipeline.spawn();

        tokio::time::sleep(Duration::from_millis(45)).await;
        cancel.cancel();
        let errors = drain(errors).await;

        let admitted = metrics.snapshot().admitted_count;
        assert!(admitted >= 1 && admitted < 100, "admitted {admitted}");
        // only already launched tasks report, and each reports once
        assert_eq!(errors.len() as u64, admitted);

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(target.calls.load(std::sync::atomic::Ordering::SeqCst), admitted);
        assert_eq!(metrics.snapshot().admitted_count, admitted);
    }

    #[tokio::test]
    async fn test_admission_paced_by_interval() {
        let target = Arc::new(CountingTarget::default());
        let interval = Duration::from_millis(25);
        let config = Arc::new(PipelineConfig::default().with_interval(interval));

        let started = Instant::now();
        drain(push(
            &b"1\n2\n3\n4\n5\n"[..],
            Arc::clone(&target),
            config,
            CancellationToken::new(),
        ))
        .await;

        assert_eq!(target.calls(), 5);
        assert!(started.elapsed() >= interval * 4);
    }

    #[tokio::test]
    async fn test_slow_deliveries_overlap() {
        let target = Arc::new(SlowTarget::new(Duration::from_millis(200)));
        let config = Arc::new(PipelineConfig::default().with_interval(Duration::from_millis(5)));

        let started = Instant::now();
        let errors = drain(push(
            &b"1\n2\n3\n4\n5\n"[..],
            Arc::clone(&target),
            config,
            CancellationToken::new(),
        ))
        .await;

        assert!(errors.is_empty());
        // sequential delivery would take at least one second
        assert!(started.elapsed() < Duration::from_millis(900));
    }
}

#[cfg(test)]
mod settings_tests {
    use std::sync::Arc;

    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::CancellationToken;
    use dispatcher::push;

    use crate::support::*;

    #[tokio::test]
    async fn test_loaded_settings_drive_pipeline() {
        let settings = ConfigLoader::load_from_str(
            "[pipeline]\nskip_empty_lines = true\ninterval = \"0s\"\nqueue_capacity = 1\n",
            ConfigFormat::Toml,
        )
        .unwrap();
        let target = Arc::new(CountingTarget::default());

        let errors = drain(push(
            &b"a\n\n\nb\n\nc\n"[..],
            Arc::clone(&target),
            Arc::new(settings.pipeline),
            CancellationToken::new(),
        ))
        .await;

        assert!(errors.is_empty());
        assert_eq!(target.sorted_payloads(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_largest_max_line_length_is_usable() {
        let settings = ConfigLoader::load_from_str(
            r#"{ "pipeline": { "max_line_length": 18446744073709551615, "interval": "0s" } }"#,
            ConfigFormat::Json,
        )
        .unwrap();
        let target = Arc::new(CountingTarget::default());

        let errors = drain(push(
            &b"first\nsecond\n"[..],
            Arc::clone(&target),
            Arc::new(settings.pipeline),
            CancellationToken::new(),
        ))
        .await;

        assert!(errors.is_empty());
        assert_eq!(target.sorted_payloads(), vec!["first", "second"]);
    }
}

#[cfg(test)]
mod http_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use contracts::{CancellationToken, DeliveryError, PipelineConfig, PushError};
    use dispatcher::{push, HttpTarget, HttpTargetConfig};
    use wiremock::{matchers, Mock, MockServer, ResponseTemplate};

    use crate::support::drain;

    fn config() -> Arc<PipelineConfig> {
        Arc::new(PipelineConfig::default().with_interval(Duration::from_millis(1)))
    }

    #[tokio::test]
    async fn test_http_end_to_end() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .and(matchers::path("/ingest"))
            .respond_with(ResponseTemplate::new(202))
            .expect(3)
            .mount(&server)
            .await;

        let target = HttpTarget::new(HttpTargetConfig::new(format!("{}/ingest", server.uri())))
            .unwrap();

        let errors = drain(push(
            &b"m1\r\nm2\r\nm3\r\n"[..],
            Arc::new(target),
            config(),
            CancellationToken::new(),
        ))
        .await;

        assert!(errors.is_empty());
        let bodies: Vec<_> = server
            .received_requests()
            .await
            .unwrap()
            .into_iter()
            .map(|r| String::from_utf8(r.body).unwrap())
            .collect();
        assert_eq!(bodies.len(), 3);
        assert!(bodies.iter().all(|b| !b.ends_with('\r')));
    }

    #[tokio::test]
    async fn test_http_rejections_are_reported() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .and(matchers::body_string("bad"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let target = HttpTarget::new(HttpTargetConfig::new(server.uri())).unwrap();

        let errors = drain(push(
            &b"good\nbad\ngood\n"[..],
            Arc::new(target),
            config(),
            CancellationToken::new(),
        ))
        .await;

        assert_eq!(errors.len(), 1);
        match &errors[0] {
            PushError::Delivery {
                line,
                payload,
                cause,
            } => {
                assert_eq!(*line, 2);
                assert_eq!(payload, "bad");
                assert_eq!(*cause, DeliveryError::Status { status_code: 500 });
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
