//! # Window Store
//!
//! Thread-safe per-user sliding windows over the live sample stream.
//!
//! Responsibilities:
//! - Bounded drop-oldest ring buffer per user, created lazily on first append
//! - Snapshot reads of the most recent N samples for analysis workers
//! - Latest-analysis-result cache (last-write-wins)
//!
//! One exclusive lock guards all mutation; operations copy in/out and never
//! perform I/O or heavy computation under the lock, so ingestion is never
//! blocked by readers.

mod buffer;
mod store;

pub use buffer::ChannelBuffer;
pub use store::{StoreStats, WindowStore};
