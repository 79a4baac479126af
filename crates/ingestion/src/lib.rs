//! # Ingestion
//!
//! Inbound message handling: decompress, decode, reconstruct timestamps,
//! feed the live window store and dual-write the durable copy.
//!
//! Delivery is at-least-once. A message is acked only after both durable
//! writes succeed; storage failures nack with backoff and the same payload
//! comes around again. Malformed payloads are acked and dropped - replaying
//! them can never succeed.

mod consumer;
mod driver;
mod message;
mod metrics;
mod mock;

pub use consumer::run_consumer;
pub use driver::IngestDriver;
pub use message::{Disposition, InboundMessage};
pub use metrics::{IngestMetrics, IngestSnapshot};
pub use mock::{MockDeviceConfig, MockDeviceSource};
