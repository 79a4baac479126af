//! Shared configuration contracts
//!
//! Parsed by `config_loader`, consumed across crates.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete pipeline configuration blueprint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryBlueprint {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Signal stream parameters
    #[serde(default)]
    pub stream: StreamConfig,

    /// Ingestion driver parameters
    #[serde(default)]
    pub ingest: IngestConfig,

    /// Export orchestrator parameters
    #[serde(default)]
    pub export: ExportConfig,
}

impl Default for TelemetryBlueprint {
    fn default() -> Self {
        Self {
            version: ConfigVersion::V1,
            stream: StreamConfig::default(),
            ingest: IngestConfig::default(),
            export: ExportConfig::default(),
        }
    }
}

/// Signal stream parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Device sampling rate (Hz)
    pub sample_rate: u32,

    /// Channel names in wire order
    pub channel_names: Vec<String>,

    /// Seconds of history each live buffer retains
    pub buffer_max_secs: f64,

    /// Window length fed to the analyzer (seconds)
    pub analysis_window_secs: f64,

    /// Interval between analysis cycles (seconds)
    pub analysis_interval_secs: f64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            sample_rate: 256,
            channel_names: default_channel_names(),
            buffer_max_secs: 60.0,
            analysis_window_secs: 5.0,
            analysis_interval_secs: 5.0,
        }
    }
}

impl StreamConfig {
    /// Live buffer capacity in samples
    pub fn buffer_capacity(&self) -> usize {
        (self.sample_rate as f64 * self.buffer_max_secs) as usize
    }

    /// Analysis window length in samples
    pub fn analysis_window_samples(&self) -> usize {
        (self.sample_rate as f64 * self.analysis_window_secs) as usize
    }
}

fn default_channel_names() -> Vec<String> {
    ["Fp1", "Fp2", "F7", "F8", "T7", "T8", "P7", "P8"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Ingestion driver parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Object-store bucket for raw chunks
    pub bucket: String,

    /// Object key prefix (data type namespace)
    pub key_prefix: String,

    /// Bounded inbound queue capacity
    pub queue_capacity: usize,

    /// Backoff before redelivering a nacked message (seconds)
    pub retry_backoff_secs: f64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            bucket: "raw-data".to_string(),
            key_prefix: "eeg".to_string(),
            queue_capacity: 100,
            retry_backoff_secs: 5.0,
        }
    }
}

/// Export orchestrator parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Root directory for job workspaces and finished archives
    pub output_dir: PathBuf,

    /// Bounded fan-out width for chunk fetches within one session
    pub fetch_concurrency: usize,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("exports"),
            fetch_concurrency: 4,
        }
    }
}
