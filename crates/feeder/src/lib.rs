//! # Feeder
//!
//! Line feeder: turns a raw byte stream into an ordered sequence of `Message`s.
//!
//! Responsibilities:
//! - Split the input into lines (`\n`, optional trailing `\r` dropped)
//! - Push each line onto a bounded async-channel (backpressure against the dispatcher)
//! - Report a read failure once, then stop
//! - Observe the shared cancellation token between reads and before every send
//!
//! ## Usage Example
//!
//! ```ignore
//! use feeder::Feeder;
//!
//! let output = Feeder::new(tokio::io::stdin(), config, cancel).spawn();
//! while let Ok(message) = output.messages.recv().await {
//!     // dispatch message
//! }
//! ```

mod feeder;
mod lines;
mod metrics;

pub use contracts::Message;
pub use feeder::{FeedOutput, Feeder};
pub use lines::LineReader;
pub use metrics::{FeedMetrics, FeedSnapshot};
