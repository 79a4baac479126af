//! Job status registry
//!
//! Injected wherever jobs are submitted or queried; cloning shares the same
//! underlying map. Terminal statuses are retained until `remove` - callers
//! own the eviction policy, the registry never expires entries itself.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use contracts::{JobId, JobStatus};

/// Shared registry of export job statuses
#[derive(Debug, Clone, Default)]
pub struct JobRegistry {
    jobs: Arc<Mutex<HashMap<JobId, JobStatus>>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fresh job as Pending
    pub fn submit(&self, job_id: &str) {
        self.lock().insert(job_id.to_string(), JobStatus::pending());
    }

    /// Status snapshot; `None` means the id was never submitted (or pruned),
    /// which is distinct from any lifecycle state
    pub fn get(&self, job_id: &str) -> Option<JobStatus> {
        self.lock().get(job_id).cloned()
    }

    /// Overwrite a job's status
    pub fn update(&self, job_id: &str, status: JobStatus) {
        self.lock().insert(job_id.to_string(), status);
    }

    /// Drop a job's status, returning the final snapshot if present
    pub fn remove(&self, job_id: &str) -> Option<JobStatus> {
        self.lock().remove(job_id)
    }

    /// All known job ids
    pub fn job_ids(&self) -> Vec<JobId> {
        self.lock().keys().cloned().collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<JobId, JobStatus>> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
