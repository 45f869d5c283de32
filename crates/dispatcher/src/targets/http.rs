//! HttpTarget - one POST per message

use std::time::Duration;

use contracts::{
    CancellationToken, DeliveryError, DeliveryTarget, Message, DEFAULT_CONTENT_TYPE,
    DEFAULT_REQUEST_TIMEOUT,
};
use reqwest::{header::CONTENT_TYPE, StatusCode, Url};
use tracing::{debug, info, instrument};

use crate::error::DispatcherError;

const USER_AGENT: &str = concat!("pusher/", env!("CARGO_PKG_VERSION"));

/// Configuration for HttpTarget
#[derive(Debug, Clone)]
pub struct HttpTargetConfig {
    /// Endpoint receiving the POSTs
    pub url: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Value of the `Content-Type` header
    pub content_type: String,
    /// Log every request
    pub verbose: bool,
}

impl HttpTargetConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
            verbose: false,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

/// Target that POSTs each payload to a fixed URL
///
/// A delivery succeeds on 200, 201 or 202. Any other final status is a
/// `DeliveryError::Status`; redirects are followed by the client first.
pub struct HttpTarget {
    client: reqwest::Client,
    url: Url,
    config: HttpTargetConfig,
}

impl HttpTarget {
    /// Create a new HttpTarget
    ///
    /// # Errors
    /// Fails if the URL does not parse, is not http(s), or the client cannot
    /// be built.
    pub fn new(config: HttpTargetConfig) -> Result<Self, DispatcherError> {
        let url = Url::parse(&config.url)
            .map_err(|e| DispatcherError::target_creation("http", format!("invalid url '{}': {e}", config.url)))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(DispatcherError::target_creation(
                "http",
                format!("unsupported scheme '{}'", url.scheme()),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| {
                DispatcherError::target_creation("http", format!("failed to build HTTP client: {e}"))
            })?;

        debug!(url = %url, timeout_ms = config.timeout.as_millis() as u64, "HttpTarget created");

        Ok(Self {
            client,
            url,
            config,
        })
    }

    /// Endpoint URL
    pub fn url(&self) -> &Url {
        &self.url
    }

    fn classify(&self, error: reqwest::Error) -> DeliveryError {
        if error.is_timeout() {
            DeliveryError::Timeout {
                timeout_ms: self.config.timeout.as_millis() as u64,
            }
        } else if error.is_builder() {
            DeliveryError::invalid_target(error.to_string())
        } else {
            DeliveryError::transport(error.to_string())
        }
    }
}

fn is_accepted(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::OK | StatusCode::CREATED | StatusCode::ACCEPTED
    )
}

impl DeliveryTarget for HttpTarget {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(
        name = "http_target_deliver",
        skip(self, message, cancel),
        fields(line = message.line, bytes = message.len())
    )]
    async fn deliver(
        &self,
        message: &Message,
        cancel: &CancellationToken,
    ) -> Result<(), DeliveryError> {
        if self.config.verbose {
            info!(url = %self.url, "POST");
        }

        let request = self
            .client
            .post(self.url.clone())
            .header(CONTENT_TYPE, &self.config.content_type)
            .body(message.payload.clone())
            .send();

        let response = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(DeliveryError::Cancelled),
            sent = request => sent.map_err(|e| self.classify(e))?,
        };

        let status = response.status();
        debug!(status = status.as_u16(), "Received response");

        if is_accepted(status) {
            Ok(())
        } else {
            Err(DeliveryError::status(status.as_u16()))
        }
    }
}
