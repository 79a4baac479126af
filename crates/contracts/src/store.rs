//! Storage collaborator traits
//!
//! The object store and the relational metadata index are external services;
//! these traits pin down exactly the contract this core consumes. Ordering
//! guarantees (sessions/chunks by start time, events by onset) are owned by
//! the store - consumers must not re-sort.

use bytes::Bytes;

use crate::{ChunkMeta, SessionEvent, SessionInfo, TelemetryError};

/// Object store contract - compressed chunk payloads by key
#[trait_variant::make(ChunkStore: Send)]
pub trait LocalChunkStore {
    /// Fetch one object's bytes
    ///
    /// # Errors
    /// Missing key or backend failure both surface as [`TelemetryError::ObjectStore`].
    async fn fetch(&self, key: &str) -> Result<Bytes, TelemetryError>;

    /// Store bytes under a key with a declared content type
    async fn store(
        &self,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<(), TelemetryError>;

    /// Ensure the backing bucket/container exists (idempotent)
    async fn ensure_bucket(&self) -> Result<(), TelemetryError>;
}

/// Metadata index contract
///
/// Insert idempotency is NOT guaranteed: at-least-once delivery means retried
/// messages can insert duplicate chunk rows. Readers tolerate duplicates;
/// object keys carry a uniqueness token so replays never collide in the
/// object store.
#[trait_variant::make(MetadataStore: Send)]
pub trait LocalMetadataStore {
    /// Sessions of a dataset, start time ascending
    async fn list_sessions(&self, dataset_id: &str) -> Result<Vec<SessionInfo>, TelemetryError>;

    /// Chunk metadata of a session, start time ascending
    async fn list_chunks(&self, session_id: &str) -> Result<Vec<ChunkMeta>, TelemetryError>;

    /// Annotated events of a session, onset ascending
    async fn list_events(&self, session_id: &str) -> Result<Vec<SessionEvent>, TelemetryError>;

    /// Record metadata for one ingested chunk
    async fn insert_chunk(&self, meta: ChunkMeta) -> Result<(), TelemetryError>;
}
