//! In-memory collaborator backends
//!
//! Used by unit/e2e tests and device-less mock runs. Both stores honor the
//! contract's ordering guarantees by sorting on read.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use bytes::Bytes;

use contracts::{
    ChunkMeta, ChunkStore, MetadataStore, SessionEvent, SessionInfo, TelemetryError,
};

/// In-memory object store
#[derive(Debug, Default)]
pub struct MemoryChunkStore {
    objects: Mutex<HashMap<String, Bytes>>,
}

impl MemoryChunkStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-load an object (test setup)
    pub fn put(&self, key: impl Into<String>, data: impl Into<Bytes>) {
        self.objects_lock().insert(key.into(), data.into());
    }

    /// Number of stored objects
    pub fn len(&self) -> usize {
        self.objects_lock().len()
    }

    /// Whether the store holds no objects
    pub fn is_empty(&self) -> bool {
        self.objects_lock().is_empty()
    }

    /// All stored keys (test assertions)
    pub fn keys(&self) -> Vec<String> {
        self.objects_lock().keys().cloned().collect()
    }

    fn objects_lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Bytes>> {
        self.objects.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ChunkStore for MemoryChunkStore {
    async fn fetch(&self, key: &str) -> Result<Bytes, TelemetryError> {
        self.objects_lock()
            .get(key)
            .cloned()
            .ok_or_else(|| TelemetryError::object_store(key, "object not found"))
    }

    async fn store(
        &self,
        key: &str,
        data: Bytes,
        _content_type: &str,
    ) -> Result<(), TelemetryError> {
        self.objects_lock().insert(key.to_string(), data);
        Ok(())
    }

    async fn ensure_bucket(&self) -> Result<(), TelemetryError> {
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MetadataInner {
    sessions: HashMap<String, Vec<SessionInfo>>,
    chunks: HashMap<String, Vec<ChunkMeta>>,
    events: HashMap<String, Vec<SessionEvent>>,
    inserted: Vec<ChunkMeta>,
}

/// In-memory metadata index
#[derive(Debug, Default)]
pub struct MemoryMetadataStore {
    inner: Mutex<MetadataInner>,
    insert_failures: AtomicUsize,
}

impl MemoryMetadataStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session under a dataset (test setup)
    pub fn add_session(&self, dataset_id: impl Into<String>, session: SessionInfo) {
        self.lock()
            .sessions
            .entry(dataset_id.into())
            .or_default()
            .push(session);
    }

    /// Register chunk metadata under a session (test setup)
    pub fn add_chunk(&self, session_id: impl Into<String>, meta: ChunkMeta) {
        self.lock()
            .chunks
            .entry(session_id.into())
            .or_default()
            .push(meta);
    }

    /// Register an event under a session (test setup)
    pub fn add_event(&self, session_id: impl Into<String>, event: SessionEvent) {
        self.lock()
            .events
            .entry(session_id.into())
            .or_default()
            .push(event);
    }

    /// Rows recorded through `insert_chunk` (test assertions)
    pub fn inserted_chunks(&self) -> Vec<ChunkMeta> {
        self.lock().inserted.clone()
    }

    /// Fail the next `count` `insert_chunk` calls, then recover (test setup)
    pub fn fail_next_inserts(&self, count: usize) {
        self.insert_failures.store(count, Ordering::SeqCst);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MetadataInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MetadataStore for MemoryMetadataStore {
    async fn list_sessions(&self, dataset_id: &str) -> Result<Vec<SessionInfo>, TelemetryError> {
        let mut sessions = self
            .lock()
            .sessions
            .get(dataset_id)
            .cloned()
            .unwrap_or_default();
        sessions.sort_by_key(|s| s.start_time);
        Ok(sessions)
    }

    async fn list_chunks(&self, session_id: &str) -> Result<Vec<ChunkMeta>, TelemetryError> {
        let mut chunks = self
            .lock()
            .chunks
            .get(session_id)
            .cloned()
            .unwrap_or_default();
        chunks.sort_by_key(|c| c.start_time);
        Ok(chunks)
    }

    async fn list_events(&self, session_id: &str) -> Result<Vec<SessionEvent>, TelemetryError> {
        let mut events = self
            .lock()
            .events
            .get(session_id)
            .cloned()
            .unwrap_or_default();
        events.sort_by(|a, b| a.onset_secs.total_cmp(&b.onset_secs));
        Ok(events)
    }

    async fn insert_chunk(&self, meta: ChunkMeta) -> Result<(), TelemetryError> {
        if self.insert_failures.load(Ordering::SeqCst) > 0 {
            self.insert_failures.fetch_sub(1, Ordering::SeqCst);
            return Err(TelemetryError::metadata_store("injected insert outage"));
        }
        // Duplicates are possible under at-least-once retry; keep them all,
        // readers tolerate duplicate rows.
        self.lock().inserted.push(meta);
        Ok(())
    }
}
