//! # Contracts
//!
//! Frozen interface contracts shared by every crate of the pusher pipeline.
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Data Model
//! - `Message`: one input line, terminator stripped, tagged with its line number
//! - `PipelineConfig`: read-only options shared by reference across components
//! - `DeliveryTarget`: the "deliver one message" capability the core is generic over
//! - `PushError`: the only item type on the caller-visible error stream

mod error;
mod message;
mod pipeline_config;
mod settings;
mod target;

pub use error::*;
pub use message::Message;
pub use pipeline_config::*;
pub use settings::*;
pub use target::*;

pub use tokio_util::sync::CancellationToken;
