//! Dataset writers
//!
//! `FsDatasetWriter` is the plain-file stand-in for the external toolkit's
//! format writer; `MemoryDatasetWriter` exists for tests that need to assert
//! on what the export worker handed over, or to inject writer failures.

use std::fmt::Write as _;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use tracing::debug;

use contracts::{DatasetWriter, RecordingMeta, SignalMatrix, TelemetryError};

const WRITER_NAME: &str = "fs";

/// Writes one recording as a small file set under
/// `{out_dir}/sub-{subject}/ses-{date}/`:
///
/// - `{base}_eeg.bin` - f32 little-endian samples, channel-major
/// - `{base}_channels.tsv` - channel name table
/// - `{base}_events.tsv` - event table (only when events exist)
/// - `{base}_eeg.json` - recording sidecar
#[derive(Debug, Clone, Default)]
pub struct FsDatasetWriter;

impl FsDatasetWriter {
    pub fn new() -> Self {
        Self
    }
}

impl DatasetWriter for FsDatasetWriter {
    fn name(&self) -> &str {
        WRITER_NAME
    }

    async fn write_recording(
        &self,
        matrix: &SignalMatrix,
        meta: &RecordingMeta,
        out_dir: &Path,
    ) -> Result<(), TelemetryError> {
        if matrix.is_empty() {
            return Err(TelemetryError::writer(WRITER_NAME, "empty signal matrix"));
        }
        if matrix.data.len() != meta.channel_names.len() {
            return Err(TelemetryError::writer(
                WRITER_NAME,
                format!(
                    "{} channel rows but {} channel names",
                    matrix.data.len(),
                    meta.channel_names.len()
                ),
            ));
        }

        let session_label = meta.start_time.format("%Y%m%d").to_string();
        let recording_dir = out_dir
            .join(format!("sub-{}", meta.subject))
            .join(format!("ses-{session_label}"));
        tokio::fs::create_dir_all(&recording_dir)
            .await
            .map_err(|e| TelemetryError::writer(WRITER_NAME, format!("mkdir failed: {e}")))?;

        let base = format!(
            "sub-{}_ses-{session_label}_task-{}",
            meta.subject, meta.task
        );

        // Channel-major f32 LE; column count is uniform across rows.
        let mut signal = Vec::with_capacity(matrix.data.len() * matrix.len() * 4);
        for row in &matrix.data {
            for &volts in row {
                signal.extend_from_slice(&(volts as f32).to_le_bytes());
            }
        }
        tokio::fs::write(recording_dir.join(format!("{base}_eeg.bin")), &signal)
            .await
            .map_err(|e| TelemetryError::writer(WRITER_NAME, format!("signal write: {e}")))?;

        let mut channels = String::from("name\ttype\tunits\n");
        for name in &meta.channel_names {
            let _ = writeln!(channels, "{name}\tEEG\tV");
        }
        tokio::fs::write(recording_dir.join(format!("{base}_channels.tsv")), channels)
            .await
            .map_err(|e| TelemetryError::writer(WRITER_NAME, format!("channels write: {e}")))?;

        if !meta.events.is_empty() {
            let mut events = String::from("onset\tduration\tdescription\n");
            for event in &meta.events {
                let _ = writeln!(
                    events,
                    "{}\t{}\t{}",
                    event.onset_secs, event.duration_secs, event.description
                );
            }
            tokio::fs::write(recording_dir.join(format!("{base}_events.tsv")), events)
                .await
                .map_err(|e| TelemetryError::writer(WRITER_NAME, format!("events write: {e}")))?;
        }

        let sidecar = serde_json::to_vec_pretty(meta)
            .map_err(|e| TelemetryError::writer(WRITER_NAME, format!("sidecar: {e}")))?;
        tokio::fs::write(recording_dir.join(format!("{base}_eeg.json")), sidecar)
            .await
            .map_err(|e| TelemetryError::writer(WRITER_NAME, format!("sidecar write: {e}")))?;

        debug!(
            subject = %meta.subject,
            session = %meta.session_id,
            samples = matrix.len(),
            "wrote recording"
        );
        Ok(())
    }
}

/// Test double: records every write, optionally failing on demand
#[derive(Debug, Default)]
pub struct MemoryDatasetWriter {
    written: Mutex<Vec<RecordingMeta>>,
    fail: AtomicBool,
}

impl MemoryDatasetWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `write_recording` fail
    pub fn fail_writes(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    /// Metadata of every successful write, in call order
    pub fn written(&self) -> Vec<RecordingMeta> {
        self.written
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl DatasetWriter for MemoryDatasetWriter {
    fn name(&self) -> &str {
        "memory"
    }

    async fn write_recording(
        &self,
        _matrix: &SignalMatrix,
        meta: &RecordingMeta,
        _out_dir: &Path,
    ) -> Result<(), TelemetryError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(TelemetryError::writer("memory", "injected write failure"));
        }
        self.written
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(meta.clone());
        Ok(())
    }
}
