//! Queue consumer loop

use std::sync::Arc;
use std::time::Duration;

use async_channel::Receiver;
use tracing::{debug, info, warn};

use contracts::{ChunkStore, MetadataStore};

use crate::driver::IngestDriver;
use crate::message::{Disposition, InboundMessage};

/// Drain a bounded queue through the driver until the channel closes
///
/// Several consumers may share one receiver; `async-channel` hands each
/// message to exactly one of them. A nacked message is retried in place
/// after the configured backoff, which preserves per-consumer ordering and
/// keeps applying backpressure upstream while storage is down.
pub async fn run_consumer<C, M>(
    receiver: Receiver<InboundMessage>,
    driver: Arc<IngestDriver<C, M>>,
    retry_backoff: Duration,
) where
    C: ChunkStore,
    M: MetadataStore,
{
    debug!("consumer started");
    while let Ok(message) = receiver.recv().await {
        let mut attempt = 1u32;
        while driver.handle(&message).await == Disposition::Retry {
            warn!(attempt, backoff = ?retry_backoff, "redelivering after backoff");
            tokio::time::sleep(retry_backoff).await;
            attempt += 1;
        }
    }
    info!("consumer stopped, channel closed");
}
