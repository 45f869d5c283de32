//! # Dispatcher
//!
//! Rate-limited concurrent delivery.
//!
//! Responsibilities:
//! - Admit one `Message` per interval tick from the feeder queue
//! - Launch one independent delivery task per admitted message
//! - Join every launched task before closing the error output
//! - Fan in feeder and delivery errors into one stream (`merge`)

pub mod dispatcher;
pub mod error;
pub mod merge;
pub mod metrics;
pub mod pipeline;
pub mod targets;
mod task;

pub use contracts::{DeliveryTarget, Message, PushError};
pub use dispatcher::Dispatcher;
pub use error::DispatcherError;
pub use merge::merge;
pub use metrics::{DispatchMetrics, DispatchSnapshot};
pub use pipeline::{push, PushPipeline};
pub use targets::{HttpTarget, HttpTargetConfig, LogTarget};
