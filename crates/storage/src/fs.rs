//! Filesystem-backed collaborator backends
//!
//! Lets the whole pipeline run end-to-end on a single machine: objects land
//! as plain files under a bucket directory, metadata lives in JSON documents
//! that can be inspected and hand-edited.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use contracts::{
    ChunkMeta, ChunkStore, MetadataStore, SessionEvent, SessionInfo, TelemetryError,
};

/// Object store over a local directory tree
///
/// An object `key` maps to the file `{root}/{bucket}/{key}`; keys may contain
/// `/` and become subdirectories.
#[derive(Debug, Clone)]
pub struct FsChunkStore {
    root: PathBuf,
    bucket: String,
}

impl FsChunkStore {
    pub fn new(root: impl Into<PathBuf>, bucket: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            bucket: bucket.into(),
        }
    }

    fn object_path(&self, key: &str) -> PathBuf {
        self.root.join(&self.bucket).join(key)
    }
}

impl ChunkStore for FsChunkStore {
    async fn fetch(&self, key: &str) -> Result<Bytes, TelemetryError> {
        let path = self.object_path(key);
        let data = tokio::fs::read(&path)
            .await
            .map_err(|e| TelemetryError::object_store(key, format!("read failed: {e}")))?;
        Ok(Bytes::from(data))
    }

    async fn store(
        &self,
        key: &str,
        data: Bytes,
        _content_type: &str,
    ) -> Result<(), TelemetryError> {
        let path = self.object_path(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| TelemetryError::object_store(key, format!("mkdir failed: {e}")))?;
        }
        tokio::fs::write(&path, &data)
            .await
            .map_err(|e| TelemetryError::object_store(key, format!("write failed: {e}")))?;
        debug!(key, bytes = data.len(), "stored object");
        Ok(())
    }

    async fn ensure_bucket(&self) -> Result<(), TelemetryError> {
        let path = self.root.join(&self.bucket);
        tokio::fs::create_dir_all(&path).await.map_err(|e| {
            TelemetryError::object_store(&self.bucket, format!("bucket create failed: {e}"))
        })?;
        Ok(())
    }
}

/// Metadata index over JSON documents in one directory
///
/// - `sessions.json`: `{dataset_id: [SessionInfo]}`
/// - `chunks.json`: `{session_id: [ChunkMeta]}`
/// - `events.json`: `{session_id: [SessionEvent]}`
/// - `ingested_chunks.json`: flat `[ChunkMeta]`, appended by `insert_chunk`
///
/// A missing document reads as empty, so a fresh directory works out of the
/// box. Writes go through read-modify-write of the whole document; fine for
/// a single-process local deployment, not for concurrent writers.
#[derive(Debug, Clone)]
pub struct JsonMetadataStore {
    dir: PathBuf,
}

impl JsonMetadataStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    async fn load<T: DeserializeOwned + Default>(&self, file: &str) -> Result<T, TelemetryError> {
        let path = self.dir.join(file);
        let raw = match tokio::fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(T::default()),
            Err(e) => {
                return Err(TelemetryError::metadata_store(format!(
                    "read {}: {e}",
                    path.display()
                )))
            }
        };
        serde_json::from_slice(&raw).map_err(|e| {
            TelemetryError::metadata_store(format!("parse {}: {e}", path.display()))
        })
    }

    async fn save<T: Serialize>(&self, file: &str, value: &T) -> Result<(), TelemetryError> {
        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            TelemetryError::metadata_store(format!("mkdir {}: {e}", self.dir.display()))
        })?;
        let raw = serde_json::to_vec_pretty(value)
            .map_err(|e| TelemetryError::metadata_store(format!("serialize {file}: {e}")))?;
        let path = self.dir.join(file);
        tokio::fs::write(&path, raw).await.map_err(|e| {
            TelemetryError::metadata_store(format!("write {}: {e}", path.display()))
        })
    }

    /// Directory holding the JSON documents
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl MetadataStore for JsonMetadataStore {
    async fn list_sessions(&self, dataset_id: &str) -> Result<Vec<SessionInfo>, TelemetryError> {
        let all: HashMap<String, Vec<SessionInfo>> = self.load("sessions.json").await?;
        let mut sessions = all.get(dataset_id).cloned().unwrap_or_default();
        sessions.sort_by_key(|s| s.start_time);
        Ok(sessions)
    }

    async fn list_chunks(&self, session_id: &str) -> Result<Vec<ChunkMeta>, TelemetryError> {
        let all: HashMap<String, Vec<ChunkMeta>> = self.load("chunks.json").await?;
        let mut chunks = all.get(session_id).cloned().unwrap_or_default();
        chunks.sort_by_key(|c| c.start_time);
        Ok(chunks)
    }

    async fn list_events(&self, session_id: &str) -> Result<Vec<SessionEvent>, TelemetryError> {
        let all: HashMap<String, Vec<SessionEvent>> = self.load("events.json").await?;
        let mut events = all.get(session_id).cloned().unwrap_or_default();
        events.sort_by(|a, b| a.onset_secs.total_cmp(&b.onset_secs));
        Ok(events)
    }

    async fn insert_chunk(&self, meta: ChunkMeta) -> Result<(), TelemetryError> {
        let mut rows: Vec<ChunkMeta> = self.load("ingested_chunks.json").await?;
        rows.push(meta);
        self.save("ingested_chunks.json", &rows).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn test_fs_chunk_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsChunkStore::new(dir.path(), "raw-data");
        store.ensure_bucket().await.unwrap();

        store
            .store(
                "eeg/u1/0-1000_dev_abcd1234.zst",
                Bytes::from_static(b"zstd-bytes"),
                "application/zstd",
            )
            .await
            .unwrap();

        let got = store.fetch("eeg/u1/0-1000_dev_abcd1234.zst").await.unwrap();
        assert_eq!(got.as_ref(), b"zstd-bytes");
    }

    #[tokio::test]
    async fn test_fs_chunk_store_missing_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsChunkStore::new(dir.path(), "raw-data");
        let err = store.fetch("eeg/u1/gone.zst").await.unwrap_err();
        assert!(err.to_string().contains("gone.zst"));
    }

    #[tokio::test]
    async fn test_json_metadata_store_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonMetadataStore::new(dir.path());
        assert!(store.list_sessions("ds1").await.unwrap().is_empty());
        assert!(store.list_events("s1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_insert_chunk_appends() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonMetadataStore::new(dir.path());

        let meta = ChunkMeta {
            object_key: "eeg/u1/a.zst".into(),
            user_id: "u1".into(),
            device_id: "dev".into(),
            start_time: Utc::now(),
            end_time: Utc::now(),
            data_type: "eeg".into(),
        };
        store.insert_chunk(meta.clone()).await.unwrap();
        store.insert_chunk(meta).await.unwrap();

        let raw = tokio::fs::read(dir.path().join("ingested_chunks.json"))
            .await
            .unwrap();
        let rows: Vec<ChunkMeta> = serde_json::from_slice(&raw).unwrap();
        assert_eq!(rows.len(), 2);
    }
}
