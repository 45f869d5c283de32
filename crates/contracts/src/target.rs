//! DeliveryTarget trait - Dispatcher output interface
//!
//! Defines the abstract "deliver one message" capability.

use tokio_util::sync::CancellationToken;

use crate::{DeliveryError, Message};

/// Delivery capability
///
/// All targets must implement this trait. One instance is shared by every
/// concurrently running delivery task, so `deliver` takes `&self`.
#[trait_variant::make(DeliveryTarget: Send)]
pub trait LocalDeliveryTarget {
    /// Target name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Deliver one message
    ///
    /// Implementations must observe `cancel` and return
    /// `DeliveryError::Cancelled` promptly instead of hanging.
    ///
    /// # Errors
    /// Returns the cause of the failure; the dispatcher attaches the payload.
    async fn deliver(
        &self,
        message: &Message,
        cancel: &CancellationToken,
    ) -> Result<(), DeliveryError>;
}
