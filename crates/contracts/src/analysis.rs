//! Toolkit seams - dataset writing and live analysis
//!
//! The neuroscience toolkit itself is an external collaborator; these traits
//! define the exact call-and-receive-result surface the pipeline consumes.

use std::collections::HashMap;
use std::path::Path;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{SessionEvent, TelemetryError, UserId, CHANNEL_COUNT};

/// Channel-major signal matrix in volts
///
/// `data[ch][i]` is sample `i` of channel `ch`; all channels have equal length.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalMatrix {
    /// One row per channel
    pub data: Vec<Vec<f64>>,

    /// Absolute timestamp per sample column
    pub timestamps: Vec<DateTime<Utc>>,
}

impl SignalMatrix {
    /// Number of sample columns
    pub fn len(&self) -> usize {
        self.data.first().map(|row| row.len()).unwrap_or(0)
    }

    /// Whether the matrix holds no samples
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Recording metadata handed to the dataset writer alongside the matrix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingMeta {
    /// Subject identifier
    pub subject: UserId,

    /// Session identifier
    pub session_id: String,

    /// Recording task/kind label
    pub task: String,

    /// Source device identifier
    pub device_id: String,

    /// Wall-clock measurement start
    pub start_time: DateTime<Utc>,

    /// Sampling rate in Hz
    pub sample_rate: u32,

    /// Channel names, one per matrix row
    pub channel_names: Vec<String>,

    /// Annotated events, onset ascending
    pub events: Vec<SessionEvent>,
}

/// Opaque artifact produced by one analysis cycle
///
/// Only the latest result per user is retained; history is not kept.
#[derive(Debug, Clone, Default)]
pub struct AnalysisResult {
    /// Named image/blob artifacts (e.g. "psd", "coherence")
    pub artifacts: HashMap<String, Bytes>,

    /// When the artifacts were produced
    pub generated_at: Option<DateTime<Utc>>,
}

/// Dataset writer trait - export output interface
///
/// Given a reconstructed signal matrix and metadata, materializes a
/// domain-formatted recording under `out_dir`.
#[trait_variant::make(DatasetWriter: Send)]
pub trait LocalDatasetWriter {
    /// Writer name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Write one recording
    ///
    /// # Errors
    /// Returns a writer error (should include context); failures propagate
    /// as export-job failures.
    async fn write_recording(
        &self,
        matrix: &SignalMatrix,
        meta: &RecordingMeta,
        out_dir: &Path,
    ) -> Result<(), TelemetryError>;
}

/// Live analysis trait
///
/// Consumes a snapshot window of raw ADC channel samples and produces an
/// opaque artifact set. Runs off the ingest hot path; implementations may be
/// arbitrarily heavy.
pub trait SignalAnalyzer: Send + Sync {
    /// Analyzer name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Analyze one window of channel samples
    fn analyze(
        &self,
        window: &[[u16; CHANNEL_COUNT]],
        sample_rate: u32,
        channel_names: &[String],
    ) -> Result<AnalysisResult, TelemetryError>;
}
