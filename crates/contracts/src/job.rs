//! Export job state machine shapes
//!
//! One `JobStatus` per submitted export, mutated only by the worker task
//! executing that job and read concurrently by status-query callers.

use serde::{Deserialize, Serialize};

/// Opaque job identifier (caller-visible, globally unique per submission)
pub type JobId = String;

/// Export job lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Accepted, not yet picked up by a worker
    Pending,
    /// Worker is executing
    Running,
    /// Finished, result archive available
    Completed,
    /// Terminal failure; message carries the cause
    Failed,
}

/// Caller-visible job status snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStatus {
    /// Current state
    pub state: JobState,

    /// Progress percentage, 0-100
    pub progress: u8,

    /// Human-readable status message
    pub message: String,

    /// Archive locator, set on completion only
    pub result_locator: Option<String>,
}

impl JobStatus {
    /// Freshly submitted job
    pub fn pending() -> Self {
        Self {
            state: JobState::Pending,
            progress: 0,
            message: "task is queued".to_string(),
            result_locator: None,
        }
    }

    /// Running snapshot with progress and message
    pub fn running(progress: u8, message: impl Into<String>) -> Self {
        Self {
            state: JobState::Running,
            progress: progress.min(100),
            message: message.into(),
            result_locator: None,
        }
    }

    /// Successful terminal snapshot
    pub fn completed(result_locator: impl Into<String>) -> Self {
        Self {
            state: JobState::Completed,
            progress: 100,
            message: "export completed successfully".to_string(),
            result_locator: Some(result_locator.into()),
        }
    }

    /// Failed terminal snapshot
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            state: JobState::Failed,
            progress: 0,
            message: message.into(),
            result_locator: None,
        }
    }

    /// Whether this state accepts no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self.state, JobState::Completed | JobState::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(!JobStatus::pending().is_terminal());
        assert!(!JobStatus::running(50, "half way").is_terminal());
        assert!(JobStatus::completed("out.tar.zst").is_terminal());
        assert!(JobStatus::failed("boom").is_terminal());
    }

    #[test]
    fn test_progress_clamped() {
        assert_eq!(JobStatus::running(250, "overflow").progress, 100);
    }
}
