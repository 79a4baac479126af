//! Shared sliding-window store.
//!
//! Injected wherever live data is produced or consumed - constructed at
//! process start, dropped at process stop. Never a process-wide singleton, so
//! tests can run independent instances side by side.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use metrics::{counter, gauge};
use tracing::debug;

use contracts::{AnalysisResult, SampleRecord, StreamConfig, UserId, CHANNEL_COUNT};

use crate::buffer::ChannelBuffer;

#[derive(Default)]
struct Inner {
    buffers: HashMap<UserId, ChannelBuffer>,
    results: HashMap<UserId, AnalysisResult>,
}

/// Aggregate store counters, for logging/metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Distinct users with at least one append
    pub users: usize,

    /// Samples appended across all users
    pub samples_appended: u64,

    /// Samples evicted by overflow across all users
    pub samples_evicted: u64,
}

/// Thread-safe store of per-user sample windows and latest analysis results
///
/// A single mutex guards the maps and rings; every operation copies data in
/// or out and holds the lock for O(batch) plain memory work only.
pub struct WindowStore {
    inner: Mutex<Inner>,
    buffer_capacity: usize,
}

impl WindowStore {
    /// Create a store whose per-user buffers hold `buffer_capacity` samples
    pub fn new(buffer_capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            buffer_capacity: buffer_capacity.max(1),
        }
    }

    /// Create a store sized from stream configuration
    /// (`sample_rate × buffer_max_secs`)
    pub fn from_config(config: &StreamConfig) -> Self {
        Self::new(config.buffer_capacity())
    }

    /// Append a batch of samples to one user's window
    ///
    /// Creates the buffer lazily on first append; overflow drops oldest and
    /// never blocks the writer.
    pub fn append(&self, user_id: &UserId, samples: &[SampleRecord]) {
        if samples.is_empty() {
            return;
        }

        let mut inner = self.lock();
        let buffer = inner
            .buffers
            .entry(user_id.clone())
            .or_insert_with(|| {
                debug!(user_id = %user_id, capacity = self.buffer_capacity, "created live buffer");
                ChannelBuffer::new(self.buffer_capacity)
            });

        for sample in samples {
            buffer.push(sample.channels);
        }

        let depth = buffer.len();
        drop(inner);

        counter!("neurowire_window_samples_appended_total", "user_id" => user_id.to_string())
            .increment(samples.len() as u64);
        gauge!("neurowire_window_buffer_depth", "user_id" => user_id.to_string())
            .set(depth as f64);
    }

    /// Snapshot the newest `required` samples of one user's window
    ///
    /// `None` (not an error) while fewer than `required` samples are
    /// buffered - including for users never seen. A zero-sample request on a
    /// known user yields an empty snapshot. The returned vector is a copy;
    /// it never mutates under the caller.
    pub fn read_window(
        &self,
        user_id: &str,
        required: usize,
    ) -> Option<Vec<[u16; CHANNEL_COUNT]>> {
        self.lock().buffers.get(user_id)?.latest(required)
    }

    /// Snapshot of all user ids with at least one append
    ///
    /// Presence guarantees an append happened, not that a full window is
    /// available.
    pub fn user_ids(&self) -> Vec<UserId> {
        self.lock().buffers.keys().cloned().collect()
    }

    /// Store the latest analysis result for a user (last-write-wins)
    pub fn set_result(&self, user_id: &UserId, result: AnalysisResult) {
        self.lock().results.insert(user_id.clone(), result);
    }

    /// Latest analysis result for a user, if any cycle has completed
    pub fn get_result(&self, user_id: &str) -> Option<AnalysisResult> {
        self.lock().results.get(user_id).cloned()
    }

    /// Aggregate counters across all users
    pub fn stats(&self) -> StoreStats {
        let inner = self.lock();
        StoreStats {
            users: inner.buffers.len(),
            samples_appended: inner.buffers.values().map(|b| b.appended_count()).sum(),
            samples_evicted: inner.buffers.values().map(|b| b.evicted_count()).sum(),
        }
    }

    /// Per-user buffered depth, for diagnostics
    pub fn buffer_depth(&self, user_id: &str) -> usize {
        self.lock()
            .buffers
            .get(user_id)
            .map(|b| b.len())
            .unwrap_or(0)
    }

    // A poisoned lock only means another writer panicked mid-append; the maps
    // and rings remain structurally valid, so recover the guard.
    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
