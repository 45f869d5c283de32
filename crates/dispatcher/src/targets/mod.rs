//! Delivery target implementations

mod http;
mod log;

pub use http::{HttpTarget, HttpTargetConfig};
pub use log::LogTarget;
