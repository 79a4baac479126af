//! Durable-store row shapes
//!
//! Sessions group the raw chunks of one contiguous recording; events are the
//! per-session annotations. These mirror what the relational index serves,
//! ordered by the store itself (start time / onset ascending) - consumers
//! never re-sort.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::UserId;

/// One contiguous recording period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionInfo {
    /// Session identifier
    pub session_id: String,

    /// Owning subject
    pub user_id: UserId,

    /// Recording task/kind label (e.g. "resting", "oddball")
    pub session_kind: String,

    /// Wall-clock start of the recording
    pub start_time: DateTime<Utc>,
}

/// Metadata for one stored compressed chunk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMeta {
    /// Object-store key of the compressed payload
    pub object_key: String,

    /// Owning subject
    pub user_id: UserId,

    /// Source device identifier
    pub device_id: String,

    /// Reconstructed wall-clock time of the first sample
    pub start_time: DateTime<Utc>,

    /// Reconstructed wall-clock time of the last sample
    pub end_time: DateTime<Utc>,

    /// Payload kind (currently always "eeg")
    pub data_type: String,
}

/// Annotated event within a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionEvent {
    /// Onset relative to session start, seconds
    pub onset_secs: f64,

    /// Duration, seconds
    pub duration_secs: f64,

    /// Free-form description
    pub description: String,
}
