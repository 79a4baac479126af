//! Export job failure causes
//!
//! Every variant's `Display` string becomes the failed job's status message,
//! so each carries enough context to be read on its own.

use thiserror::Error;

use codec::CodecError;
use contracts::TelemetryError;

/// Terminal export-job error
#[derive(Debug, Error)]
pub enum ExportError {
    /// Dataset exists but has nothing to export
    #[error("no sessions found for dataset {dataset_id}")]
    NoSessions { dataset_id: String },

    /// Storage or writer collaborator failed
    #[error(transparent)]
    Storage(#[from] TelemetryError),

    /// Frame-level decode failure (counter wrap)
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Decompression or archive I/O failure
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
