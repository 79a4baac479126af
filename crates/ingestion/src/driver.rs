//! Message handling core
//!
//! One `handle` call takes a compressed device payload through the full
//! ingest path: decompress, decode, reconstruct timestamps, append to the
//! live window, then dual-write object and metadata. The live append happens
//! before the durable writes on purpose: live analysis should see data even
//! while storage is degraded, and redelivered messages appending twice only
//! costs duplicate samples in a lossy sliding window.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, warn};

use codec::CodecError;
use contracts::{ChunkMeta, ChunkStore, IngestConfig, MetadataStore, UserId, UNKNOWN_DEVICE};
use window_store::WindowStore;

use crate::message::{Disposition, InboundMessage};
use crate::metrics::IngestMetrics;

const CHUNK_CONTENT_TYPE: &str = "application/zstd";

/// Ingest path for one data type
pub struct IngestDriver<C, M> {
    chunk_store: Arc<C>,
    metadata_store: Arc<M>,
    window_store: Arc<WindowStore>,
    config: IngestConfig,
    metrics: Arc<IngestMetrics>,
}

impl<C, M> IngestDriver<C, M>
where
    C: ChunkStore,
    M: MetadataStore,
{
    pub fn new(
        chunk_store: Arc<C>,
        metadata_store: Arc<M>,
        window_store: Arc<WindowStore>,
        config: IngestConfig,
    ) -> Self {
        Self {
            chunk_store,
            metadata_store,
            window_store,
            config,
            metrics: Arc::new(IngestMetrics::new()),
        }
    }

    /// Shared counters
    pub fn metrics(&self) -> Arc<IngestMetrics> {
        self.metrics.clone()
    }

    /// Process one inbound message end to end
    ///
    /// Returns `Retry` only for storage failures; anything wrong with the
    /// payload itself is logged and acked, since redelivery cannot fix it.
    pub async fn handle(&self, message: &InboundMessage) -> Disposition {
        self.metrics.record_received();

        let raw = match zstd::decode_all(message.payload.as_ref()) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "dropping undecompressable payload");
                self.metrics.record_dropped();
                return Disposition::Ack;
            }
        };

        let frame = codec::decode(&raw);
        if frame.samples.is_empty() {
            warn!(device_id = %frame.device_id, "dropping frame with no complete samples");
            self.metrics.record_dropped();
            return Disposition::Ack;
        }
        if frame.device_id == UNKNOWN_DEVICE {
            debug!("frame carries no parseable device id");
        }

        let (start_time, end_time) =
            match codec::frame_time_range(&frame.samples, message.received_at) {
                Ok(Some(range)) => range,
                Ok(None) => unreachable!("non-empty frame has a time range"),
                Err(e @ CodecError::CounterWrapped { .. }) => {
                    warn!(device_id = %frame.device_id, error = %e, "dropping wrapped frame");
                    self.metrics.record_dropped();
                    return Disposition::Ack;
                }
            };

        // Without a routed user there is nowhere safe to file the data;
        // redelivery cannot supply one, so drop rather than guess.
        let Some(user_id) = message.user_id.clone() else {
            warn!(device_id = %frame.device_id, "dropping frame with no routed user");
            self.metrics.record_dropped();
            return Disposition::Ack;
        };

        self.window_store.append(&user_id, &frame.samples);

        let key = self.object_key(&user_id, &frame.device_id, &start_time, &end_time);
        if let Err(e) = self
            .chunk_store
            .store(&key, message.payload.clone(), CHUNK_CONTENT_TYPE)
            .await
        {
            warn!(key, error = %e, "object write failed, nacking for redelivery");
            self.metrics.record_retried();
            return Disposition::Retry;
        }

        let meta = ChunkMeta {
            object_key: key.clone(),
            user_id: user_id.clone(),
            device_id: frame.device_id.clone(),
            start_time,
            end_time,
            data_type: self.config.key_prefix.clone(),
        };
        if let Err(e) = self.metadata_store.insert_chunk(meta).await {
            // The object is already stored; the redelivered message writes a
            // fresh key, and readers tolerate the orphaned object.
            warn!(key, error = %e, "metadata write failed, nacking for redelivery");
            self.metrics.record_retried();
            return Disposition::Retry;
        }

        debug!(
            key,
            user_id = %user_id,
            samples = frame.samples.len(),
            "ingested chunk"
        );
        self.metrics.record_acked(frame.samples.len());
        Disposition::Ack
    }

    /// `{prefix}/{user}/{start_ms}-{end_ms}_{device}_{token}.zst`
    ///
    /// The random token keeps redelivered messages from colliding on key.
    fn object_key(
        &self,
        user_id: &UserId,
        device_id: &str,
        start_time: &chrono::DateTime<chrono::Utc>,
        end_time: &chrono::DateTime<chrono::Utc>,
    ) -> String {
        let device = device_id.replace(':', "");
        let token = uuid::Uuid::new_v4().simple().to_string();
        format!(
            "{}/{}/{}-{}_{}_{}.zst",
            self.config.key_prefix,
            user_id,
            start_time.timestamp_millis(),
            end_time.timestamp_millis(),
            device,
            &token[..8],
        )
    }
}

/// Compress an encoded frame the way devices do on the wire
pub(crate) fn compress_frame(encoded: &[u8]) -> std::io::Result<Bytes> {
    Ok(Bytes::from(zstd::encode_all(encoded, 3)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::SampleRecord;
    use storage::{MemoryChunkStore, MemoryMetadataStore};

    fn driver() -> IngestDriver<MemoryChunkStore, MemoryMetadataStore> {
        IngestDriver::new(
            Arc::new(MemoryChunkStore::new()),
            Arc::new(MemoryMetadataStore::new()),
            Arc::new(WindowStore::new(1_000)),
            IngestConfig::default(),
        )
    }

    fn samples(count: usize) -> Vec<SampleRecord> {
        (0..count)
            .map(|i| SampleRecord {
                channels: [2048; codec::CHANNEL_COUNT],
                device_micros: i as u32 * 3_906,
                ..Default::default()
            })
            .collect()
    }

    fn message(user: Option<&str>, samples: &[SampleRecord]) -> InboundMessage {
        let encoded = codec::encode("dev:aa:bb", samples);
        InboundMessage::new(
            user.map(Into::into),
            compress_frame(&encoded).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_happy_path_acks_and_dual_writes() {
        let driver = driver();
        let msg = message(Some("u1"), &samples(64));

        assert_eq!(driver.handle(&msg).await, Disposition::Ack);

        let inserted = driver.metadata_store.inserted_chunks();
        assert_eq!(inserted.len(), 1);
        assert_eq!(inserted[0].user_id.as_str(), "u1");
        assert_eq!(inserted[0].device_id, "dev:aa:bb");
        // Colons stripped from the key, not from the metadata row
        assert!(inserted[0].object_key.starts_with("eeg/u1/"));
        assert!(inserted[0].object_key.contains("devaabb"));
        assert!(inserted[0].object_key.ends_with(".zst"));
        assert!(inserted[0].start_time <= inserted[0].end_time);

        assert_eq!(driver.chunk_store.len(), 1);
        assert_eq!(driver.window_store.buffer_depth("u1"), 64);

        let snap = driver.metrics().snapshot();
        assert_eq!(snap.messages_acked, 1);
        assert_eq!(snap.samples_ingested, 64);
    }

    #[tokio::test]
    async fn test_stored_object_is_original_compressed_payload() {
        let driver = driver();
        let msg = message(Some("u1"), &samples(8));
        driver.handle(&msg).await;

        let key = driver.chunk_store.keys().pop().unwrap();
        let stored = driver.chunk_store.fetch(&key).await.unwrap();
        assert_eq!(stored, msg.payload);
    }

    #[tokio::test]
    async fn test_garbage_payload_acked_and_dropped() {
        let driver = driver();
        let msg = InboundMessage::new(Some("u1".into()), Bytes::from_static(b"not zstd"));

        assert_eq!(driver.handle(&msg).await, Disposition::Ack);
        assert!(driver.chunk_store.is_empty());
        assert_eq!(driver.metrics().snapshot().messages_dropped, 1);
    }

    #[tokio::test]
    async fn test_wrapped_counter_frame_dropped() {
        let driver = driver();
        let mut records = samples(4);
        records[0].device_micros = u32::MAX - 100;

        let msg = message(Some("u1"), &records);
        assert_eq!(driver.handle(&msg).await, Disposition::Ack);
        assert!(driver.chunk_store.is_empty());
        assert_eq!(driver.window_store.buffer_depth("u1"), 0);
    }

    #[tokio::test]
    async fn test_missing_user_acked_and_dropped() {
        let driver = driver();
        let msg = message(None, &samples(16));

        assert_eq!(driver.handle(&msg).await, Disposition::Ack);
        assert!(driver.chunk_store.is_empty());
        assert!(driver.metadata_store.inserted_chunks().is_empty());
        assert_eq!(driver.metrics().snapshot().messages_dropped, 1);
    }

    #[tokio::test]
    async fn test_redelivered_message_gets_fresh_key() {
        let driver = driver();
        let msg = message(Some("u1"), &samples(16));
        driver.handle(&msg).await;
        driver.handle(&msg).await;

        // Two objects, two metadata rows, distinct keys
        assert_eq!(driver.chunk_store.len(), 2);
        let inserted = driver.metadata_store.inserted_chunks();
        assert_eq!(inserted.len(), 2);
        assert_ne!(inserted[0].object_key, inserted[1].object_key);
    }
}
