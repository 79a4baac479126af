//! # Integration Tests
//!
//! End-to-end coverage that crosses crate boundaries:
//! - mock devices through the ingest queue into the live window and storage
//! - retry behavior under storage outages
//! - full export jobs from metadata down to the packaged archive

#[cfg(test)]
mod e2e_ingest {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use bytes::Bytes;
    use contracts::{ChunkStore, IngestConfig, TelemetryError};
    use ingestion::{
        run_consumer, IngestDriver, InboundMessage, MockDeviceConfig, MockDeviceSource,
    };
    use storage::{MemoryChunkStore, MemoryMetadataStore};
    use window_store::WindowStore;

    /// Object store that fails the first N writes, then recovers
    struct FlakyChunkStore {
        inner: MemoryChunkStore,
        failures_left: AtomicUsize,
    }

    impl FlakyChunkStore {
        fn new(failures: usize) -> Self {
            Self {
                inner: MemoryChunkStore::new(),
                failures_left: AtomicUsize::new(failures),
            }
        }
    }

    impl ChunkStore for FlakyChunkStore {
        async fn fetch(&self, key: &str) -> Result<Bytes, TelemetryError> {
            self.inner.fetch(key).await
        }

        async fn store(
            &self,
            key: &str,
            data: Bytes,
            content_type: &str,
        ) -> Result<(), TelemetryError> {
            if self.failures_left.load(Ordering::SeqCst) > 0 {
                self.failures_left.fetch_sub(1, Ordering::SeqCst);
                return Err(TelemetryError::object_store(key, "transient backend outage"));
            }
            self.inner.store(key, data, content_type).await
        }

        async fn ensure_bucket(&self) -> Result<(), TelemetryError> {
            Ok(())
        }
    }

    /// One compressed wire frame of midscale samples
    fn one_frame_payload() -> Bytes {
        let samples: Vec<contracts::SampleRecord> = (0..8)
            .map(|i| contracts::SampleRecord {
                channels: [2048; codec::CHANNEL_COUNT],
                device_micros: i * 3_906,
                ..Default::default()
            })
            .collect();
        let encoded = codec::encode("dev:01", &samples);
        Bytes::from(zstd::encode_all(encoded.as_ref(), 3).unwrap())
    }

    /// Mock devices -> bounded queue -> consumers -> window + dual write
    #[tokio::test]
    async fn test_mock_devices_reach_live_window_and_storage() {
        let chunk_store = Arc::new(MemoryChunkStore::new());
        let metadata_store = Arc::new(MemoryMetadataStore::new());
        let window_store = Arc::new(WindowStore::new(10_000));
        let driver = Arc::new(IngestDriver::new(
            chunk_store.clone(),
            metadata_store.clone(),
            window_store.clone(),
            IngestConfig::default(),
        ));
        let metrics = driver.metrics();

        let (tx, rx) = async_channel::bounded::<InboundMessage>(32);
        let mut consumers = Vec::new();
        for _ in 0..2 {
            consumers.push(tokio::spawn(run_consumer(
                rx.clone(),
                driver.clone(),
                Duration::from_millis(10),
            )));
        }

        let sources: Vec<MockDeviceSource> = (0..2)
            .map(|i| {
                MockDeviceSource::new(MockDeviceConfig {
                    device_id: format!("mock:00:{i:02x}"),
                    user_id: format!("subject-{}", i + 1).into(),
                    sample_rate: 256,
                    batch_size: 16,
                })
            })
            .collect();
        for source in &sources {
            source.start(tx.clone());
        }
        drop(tx);

        tokio::time::sleep(Duration::from_millis(300)).await;
        for source in &sources {
            source.stop();
        }
        for handle in consumers {
            tokio::time::timeout(Duration::from_secs(5), handle)
                .await
                .expect("consumer did not drain")
                .unwrap();
        }

        let snap = metrics.snapshot();
        assert!(snap.messages_acked > 0, "no messages made it through");
        assert_eq!(snap.messages_dropped, 0);
        assert_eq!(snap.messages_retried, 0);

        // Every acked message landed in both stores
        assert_eq!(chunk_store.len() as u64, snap.messages_acked);
        assert_eq!(
            metadata_store.inserted_chunks().len() as u64,
            snap.messages_acked
        );

        // Both subjects have live samples buffered
        assert!(window_store.buffer_depth("subject-1") > 0);
        assert!(window_store.buffer_depth("subject-2") > 0);

        // Keys carry the configured prefix and the routed user
        let key = &metadata_store.inserted_chunks()[0].object_key;
        assert!(key.starts_with("eeg/subject-"), "unexpected key {key}");
    }

    /// A storage outage nacks the message; the consumer redelivers until the
    /// backend recovers, then the message acks exactly once.
    #[tokio::test]
    async fn test_consumer_retries_through_storage_outage() {
        let chunk_store = Arc::new(FlakyChunkStore::new(2));
        let metadata_store = Arc::new(MemoryMetadataStore::new());
        let driver = Arc::new(IngestDriver::new(
            chunk_store,
            metadata_store.clone(),
            Arc::new(WindowStore::new(1_000)),
            IngestConfig::default(),
        ));
        let metrics = driver.metrics();

        let (tx, rx) = async_channel::bounded(4);
        let consumer = tokio::spawn(run_consumer(
            rx,
            driver,
            Duration::from_millis(5),
        ));

        tx.send(InboundMessage::new(Some("u1".into()), one_frame_payload()))
            .await
            .unwrap();
        drop(tx);

        tokio::time::timeout(Duration::from_secs(5), consumer)
            .await
            .expect("consumer did not drain")
            .unwrap();

        let snap = metrics.snapshot();
        assert_eq!(snap.messages_retried, 2);
        assert_eq!(snap.messages_acked, 1);
        assert_eq!(metadata_store.inserted_chunks().len(), 1);
    }

    /// A metadata outage after a successful object write also nacks; the
    /// redelivered message stores the payload again under a fresh key and
    /// indexes exactly one row, leaving the first object orphaned.
    #[tokio::test]
    async fn test_metadata_outage_orphans_object_and_converges() {
        let chunk_store = Arc::new(MemoryChunkStore::new());
        let metadata_store = Arc::new(MemoryMetadataStore::new());
        metadata_store.fail_next_inserts(1);

        let driver = Arc::new(IngestDriver::new(
            chunk_store.clone(),
            metadata_store.clone(),
            Arc::new(WindowStore::new(1_000)),
            IngestConfig::default(),
        ));
        let metrics = driver.metrics();

        let (tx, rx) = async_channel::bounded(4);
        let consumer = tokio::spawn(run_consumer(
            rx,
            driver,
            Duration::from_millis(5),
        ));

        tx.send(InboundMessage::new(Some("u1".into()), one_frame_payload()))
            .await
            .unwrap();
        drop(tx);

        tokio::time::timeout(Duration::from_secs(5), consumer)
            .await
            .expect("consumer did not drain")
            .unwrap();

        let snap = metrics.snapshot();
        assert_eq!(snap.messages_retried, 1);
        assert_eq!(snap.messages_acked, 1);

        // Both attempts wrote an object; only the second attempt got a row,
        // and the row points at the second key.
        assert_eq!(chunk_store.len(), 2);
        let inserted = metadata_store.inserted_chunks();
        assert_eq!(inserted.len(), 1);
        assert!(chunk_store.keys().contains(&inserted[0].object_key));

        let orphans: Vec<String> = chunk_store
            .keys()
            .into_iter()
            .filter(|k| *k != inserted[0].object_key)
            .collect();
        assert_eq!(orphans.len(), 1);
    }
}

#[cfg(test)]
mod export_jobs {
    use std::io::Read;
    use std::sync::Arc;
    use std::time::Duration;

    use bytes::Bytes;
    use chrono::{TimeZone, Utc};
    use contracts::{
        ChunkMeta, ChunkStore, DatasetWriter, ExportConfig, JobState, JobStatus, SessionEvent,
        SessionInfo, StreamConfig, TelemetryError,
    };
    use export::{ExportService, JobRegistry};
    use storage::{FsDatasetWriter, MemoryChunkStore, MemoryDatasetWriter, MemoryMetadataStore};

    const SAMPLE_INTERVAL_MICROS: u32 = 3_906;

    /// Object store that stalls one key, to force out-of-order completion
    struct SlowChunkStore {
        inner: MemoryChunkStore,
        slow_key: String,
    }

    /// Object store that delays every fetch, to slow a job down enough that
    /// polling observes intermediate progress
    struct ThrottledChunkStore {
        inner: MemoryChunkStore,
        delay: Duration,
    }

    impl ChunkStore for ThrottledChunkStore {
        async fn fetch(&self, key: &str) -> Result<Bytes, TelemetryError> {
            tokio::time::sleep(self.delay).await;
            self.inner.fetch(key).await
        }

        async fn store(
            &self,
            key: &str,
            data: Bytes,
            content_type: &str,
        ) -> Result<(), TelemetryError> {
            self.inner.store(key, data, content_type).await
        }

        async fn ensure_bucket(&self) -> Result<(), TelemetryError> {
            Ok(())
        }
    }

    impl ChunkStore for SlowChunkStore {
        async fn fetch(&self, key: &str) -> Result<Bytes, TelemetryError> {
            if key == self.slow_key {
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
            self.inner.fetch(key).await
        }

        async fn store(
            &self,
            key: &str,
            data: Bytes,
            content_type: &str,
        ) -> Result<(), TelemetryError> {
            self.inner.store(key, data, content_type).await
        }

        async fn ensure_bucket(&self) -> Result<(), TelemetryError> {
            Ok(())
        }
    }

    fn make_samples(count: usize) -> Vec<contracts::SampleRecord> {
        (0..count)
            .map(|i| {
                let mut channels = [2048u16; codec::CHANNEL_COUNT];
                // Channel 0 carries the sample index so order is observable
                channels[0] = i as u16;
                contracts::SampleRecord {
                    channels,
                    device_micros: i as u32 * SAMPLE_INTERVAL_MICROS,
                    ..Default::default()
                }
            })
            .collect()
    }

    /// Encode one device stream and split it into per-chunk compressed
    /// payloads the way the wire does: the header travels with the first
    /// chunk, later chunks are raw record runs.
    fn seed_session(
        chunk_store: &MemoryChunkStore,
        metadata_store: &MemoryMetadataStore,
        session_id: &str,
        chunk_count: usize,
        samples_per_chunk: usize,
    ) {
        let total = chunk_count * samples_per_chunk;
        let raw = codec::encode("dev:aa:01", &make_samples(total));

        let base = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let chunk_micros = samples_per_chunk as i64 * SAMPLE_INTERVAL_MICROS as i64;
        for i in 0..chunk_count {
            let start = codec::HEADER_SIZE + i * samples_per_chunk * codec::RECORD_SIZE;
            let end = start + samples_per_chunk * codec::RECORD_SIZE;
            let piece = if i == 0 { &raw[..end] } else { &raw[start..end] };
            let payload = zstd::encode_all(piece, 3).unwrap();

            let key = format!("eeg/u1/{session_id}-chunk-{i}.zst");
            chunk_store.put(key.clone(), payload);
            metadata_store.add_chunk(
                session_id,
                ChunkMeta {
                    object_key: key,
                    user_id: "u1".into(),
                    device_id: "dev:aa:01".to_string(),
                    start_time: base + chrono::Duration::microseconds(i as i64 * chunk_micros),
                    end_time: base + chrono::Duration::microseconds((i as i64 + 1) * chunk_micros),
                    data_type: "eeg".to_string(),
                },
            );
        }
    }

    fn session(id: &str, minute: u32) -> SessionInfo {
        SessionInfo {
            session_id: id.to_string(),
            user_id: "u1".into(),
            session_kind: "resting".to_string(),
            start_time: Utc.with_ymd_and_hms(2025, 6, 1, 12, minute, 0).unwrap(),
        }
    }

    async fn await_terminal<C, M, W>(service: &ExportService<C, M, W>, job_id: &str) -> JobStatus
    where
        C: ChunkStore + Send + Sync + 'static,
        M: contracts::MetadataStore + Send + Sync + 'static,
        W: DatasetWriter + Send + Sync + 'static,
    {
        tokio::time::timeout(Duration::from_secs(10), async {
            loop {
                if let Some(status) = service.status(job_id) {
                    if status.is_terminal() {
                        return status;
                    }
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("job never reached a terminal state")
    }

    #[tokio::test]
    async fn test_unknown_dataset_fails_with_named_dataset() {
        let out = tempfile::tempdir().unwrap();
        let service = ExportService::new(
            Arc::new(MemoryChunkStore::new()),
            Arc::new(MemoryMetadataStore::new()),
            Arc::new(MemoryDatasetWriter::new()),
            JobRegistry::new(),
            StreamConfig::default(),
            ExportConfig {
                output_dir: out.path().to_path_buf(),
                ..Default::default()
            },
        );

        let job_id = service.submit("nope");
        let status = await_terminal(&service, &job_id).await;

        assert_eq!(status.state, JobState::Failed);
        assert!(
            status.message.contains("no sessions found for dataset nope"),
            "unexpected message: {}",
            status.message
        );
    }

    #[tokio::test]
    async fn test_export_writes_one_recording_per_session() {
        let chunk_store = Arc::new(MemoryChunkStore::new());
        let metadata_store = Arc::new(MemoryMetadataStore::new());
        let writer = Arc::new(MemoryDatasetWriter::new());

        metadata_store.add_session("ds1", session("ses-a", 0));
        metadata_store.add_session("ds1", session("ses-b", 30));
        seed_session(&chunk_store, &metadata_store, "ses-a", 3, 8);
        seed_session(&chunk_store, &metadata_store, "ses-b", 2, 8);
        metadata_store.add_event(
            "ses-a",
            SessionEvent {
                onset_secs: 1.5,
                duration_secs: 0.5,
                description: "blink".to_string(),
            },
        );

        let out = tempfile::tempdir().unwrap();
        let service = ExportService::new(
            chunk_store,
            metadata_store,
            writer.clone(),
            JobRegistry::new(),
            StreamConfig::default(),
            ExportConfig {
                output_dir: out.path().to_path_buf(),
                ..Default::default()
            },
        );

        let job_id = service.submit("ds1");
        let status = await_terminal(&service, &job_id).await;

        assert_eq!(status.state, JobState::Completed);
        assert_eq!(status.progress, 100);
        let archive = status.result_locator.expect("completed job has a locator");
        assert_eq!(archive, format!("dataset_ds1_{job_id}.tar.zst"));
        assert!(out.path().join(&archive).exists());
        assert!(!out.path().join(&job_id).exists(), "job dir not removed");

        let written = writer.written();
        assert_eq!(written.len(), 2);
        let ses_a = written
            .iter()
            .find(|m| m.session_id == "ses-a")
            .expect("ses-a exported");
        assert_eq!(ses_a.subject.as_str(), "u1");
        assert_eq!(ses_a.task, "resting");
        assert_eq!(ses_a.device_id, "dev:aa:01");
        assert_eq!(ses_a.sample_rate, 256);
        assert_eq!(ses_a.channel_names.len(), codec::CHANNEL_COUNT);
        assert_eq!(ses_a.events.len(), 1);
        assert_eq!(ses_a.events[0].description, "blink");
    }

    #[tokio::test]
    async fn test_chunkless_session_skipped_not_failed() {
        let chunk_store = Arc::new(MemoryChunkStore::new());
        let metadata_store = Arc::new(MemoryMetadataStore::new());
        let writer = Arc::new(MemoryDatasetWriter::new());

        metadata_store.add_session("ds1", session("ses-a", 0));
        metadata_store.add_session("ds1", session("ses-empty", 15));
        metadata_store.add_session("ds1", session("ses-c", 30));
        seed_session(&chunk_store, &metadata_store, "ses-a", 2, 8);
        seed_session(&chunk_store, &metadata_store, "ses-c", 2, 8);

        let out = tempfile::tempdir().unwrap();
        let service = ExportService::new(
            chunk_store,
            metadata_store,
            writer.clone(),
            JobRegistry::new(),
            StreamConfig::default(),
            ExportConfig {
                output_dir: out.path().to_path_buf(),
                ..Default::default()
            },
        );

        let status = await_terminal(&service, &service.submit("ds1")).await;

        assert_eq!(status.state, JobState::Completed);
        let written = writer.written();
        assert_eq!(written.len(), 2);
        assert!(written.iter().all(|m| m.session_id != "ses-empty"));
    }

    /// Concurrent fetches must not reorder chunks: with the middle chunk
    /// stalled, the stitched stream still decodes in recorded order.
    #[tokio::test]
    async fn test_slow_middle_chunk_keeps_sample_order() {
        let inner = MemoryChunkStore::new();
        let metadata_store = Arc::new(MemoryMetadataStore::new());

        metadata_store.add_session("ds1", session("ses-a", 0));
        seed_session(&inner, &metadata_store, "ses-a", 3, 8);

        let chunk_store = Arc::new(SlowChunkStore {
            inner,
            slow_key: "eeg/u1/ses-a-chunk-1.zst".to_string(),
        });

        let out = tempfile::tempdir().unwrap();
        let service = ExportService::new(
            chunk_store,
            metadata_store,
            Arc::new(FsDatasetWriter::new()),
            JobRegistry::new(),
            StreamConfig::default(),
            ExportConfig {
                output_dir: out.path().to_path_buf(),
                fetch_concurrency: 3,
                ..Default::default()
            },
        );

        let job_id = service.submit("ds1");
        let status = await_terminal(&service, &job_id).await;
        assert_eq!(status.state, JobState::Completed);

        // Channel 0 carries the sample index; pull it back out of the
        // packaged archive and check it is strictly increasing.
        let archive = out.path().join(status.result_locator.unwrap());
        let file = std::fs::File::open(archive).unwrap();
        let decoder = zstd::Decoder::new(file).unwrap();
        let mut tar = tar::Archive::new(decoder);

        let mut signal = Vec::new();
        for entry in tar.entries().unwrap() {
            let mut entry = entry.unwrap();
            if entry.path().unwrap().to_string_lossy().ends_with("_eeg.bin") {
                entry.read_to_end(&mut signal).unwrap();
            }
        }
        assert!(!signal.is_empty(), "no signal file in archive");

        let first_row: Vec<f32> = signal[..24 * 4]
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        assert_eq!(first_row.len(), 24);
        assert!(
            first_row.windows(2).all(|w| w[0] < w[1]),
            "samples out of order: {first_row:?}"
        );
    }

    #[tokio::test]
    async fn test_progress_never_goes_backwards() {
        let inner = MemoryChunkStore::new();
        let metadata_store = Arc::new(MemoryMetadataStore::new());
        for i in 0..5u32 {
            let id = format!("ses-{i}");
            metadata_store.add_session("ds1", session(&id, i * 10));
            seed_session(&inner, &metadata_store, &id, 2, 8);
        }
        let chunk_store = Arc::new(ThrottledChunkStore {
            inner,
            delay: Duration::from_millis(25),
        });

        let out = tempfile::tempdir().unwrap();
        let service = ExportService::new(
            chunk_store,
            metadata_store,
            Arc::new(MemoryDatasetWriter::new()),
            JobRegistry::new(),
            StreamConfig::default(),
            ExportConfig {
                output_dir: out.path().to_path_buf(),
                fetch_concurrency: 1,
                ..Default::default()
            },
        );

        let job_id = service.submit("ds1");
        let mut observed = Vec::new();
        let status = tokio::time::timeout(Duration::from_secs(10), async {
            loop {
                if let Some(status) = service.status(&job_id) {
                    observed.push(status.progress);
                    if status.is_terminal() {
                        return status;
                    }
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("job never finished");

        assert_eq!(status.state, JobState::Completed);
        assert!(observed.len() > 2, "too few samples: {observed:?}");
        assert!(
            observed.windows(2).all(|w| w[0] <= w[1]),
            "progress regressed: {observed:?}"
        );
        assert_eq!(*observed.last().unwrap(), 100);
    }

    #[tokio::test]
    async fn test_failed_write_marks_job_failed_and_leaves_no_dir() {
        let chunk_store = Arc::new(MemoryChunkStore::new());
        let metadata_store = Arc::new(MemoryMetadataStore::new());
        let writer = Arc::new(MemoryDatasetWriter::new());
        writer.fail_writes();

        metadata_store.add_session("ds1", session("ses-a", 0));
        seed_session(&chunk_store, &metadata_store, "ses-a", 2, 8);

        let out = tempfile::tempdir().unwrap();
        let service = ExportService::new(
            chunk_store,
            metadata_store,
            writer,
            JobRegistry::new(),
            StreamConfig::default(),
            ExportConfig {
                output_dir: out.path().to_path_buf(),
                ..Default::default()
            },
        );

        let job_id = service.submit("ds1");
        let status = await_terminal(&service, &job_id).await;

        assert_eq!(status.state, JobState::Failed);
        assert!(
            status.message.contains("injected write failure"),
            "unexpected message: {}",
            status.message
        );
        assert!(!out.path().join(&job_id).exists(), "job dir left behind");
        let leftovers: Vec<_> = std::fs::read_dir(out.path()).unwrap().collect();
        assert!(leftovers.is_empty(), "failed job left files: {leftovers:?}");
    }
}
