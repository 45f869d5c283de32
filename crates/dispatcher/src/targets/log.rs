//! LogTarget - logs each message via tracing instead of sending it

use contracts::{CancellationToken, DeliveryError, DeliveryTarget, Message};
use tracing::{info, instrument};

/// Target that only logs what it would deliver (dry runs)
pub struct LogTarget {
    name: String,
}

impl LogTarget {
    /// Create a new LogTarget with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl DeliveryTarget for LogTarget {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_target_deliver",
        skip(self, message, cancel),
        fields(target_name = %self.name, line = message.line)
    )]
    async fn deliver(
        &self,
        message: &Message,
        cancel: &CancellationToken,
    ) -> Result<(), DeliveryError> {
        if cancel.is_cancelled() {
            return Err(DeliveryError::Cancelled);
        }
        info!(bytes = message.len(), content = %message.text(), "Message delivered");
        Ok(())
    }
}
