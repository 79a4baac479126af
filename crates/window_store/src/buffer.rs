//! Per-user bounded sample ring.
//!
//! Channel samples are small `Copy` arrays, so the ring stores them inline;
//! overflow overwrites the oldest entry without blocking the writer.

use std::fmt;

use ringbuf::{traits::*, HeapRb};

use contracts::CHANNEL_COUNT;

/// One user's bounded window of recent channel samples
pub struct ChannelBuffer {
    ring: HeapRb<[u16; CHANNEL_COUNT]>,
    capacity: usize,
    appended: u64,
    evicted: u64,
}

impl fmt::Debug for ChannelBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelBuffer")
            .field("len", &self.ring.occupied_len())
            .field("capacity", &self.capacity)
            .field("evicted", &self.evicted)
            .finish()
    }
}

impl ChannelBuffer {
    /// Create a buffer holding at most `capacity` samples
    #[inline]
    pub fn new(capacity: usize) -> Self {
        Self {
            ring: HeapRb::new(capacity.max(1)),
            capacity: capacity.max(1),
            appended: 0,
            evicted: 0,
        }
    }

    /// Push one sample, evicting the oldest when full
    #[inline]
    pub fn push(&mut self, sample: [u16; CHANNEL_COUNT]) {
        if self.ring.push_overwrite(sample).is_some() {
            self.evicted += 1;
        }
        self.appended += 1;
    }

    /// Copy out the newest `required` samples, oldest first
    ///
    /// Returns `None` while fewer than `required` samples are buffered; a
    /// zero-sample request always yields an empty snapshot.
    #[inline]
    pub fn latest(&self, required: usize) -> Option<Vec<[u16; CHANNEL_COUNT]>> {
        let len = self.ring.occupied_len();
        if len < required {
            return None;
        }
        Some(self.ring.iter().skip(len - required).copied().collect())
    }

    /// Current number of buffered samples
    #[inline]
    pub fn len(&self) -> usize {
        self.ring.occupied_len()
    }

    /// Whether the buffer holds no samples
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Configured capacity
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total samples ever appended
    #[inline]
    pub fn appended_count(&self) -> u64 {
        self.appended
    }

    /// Total samples evicted by overflow
    #[inline]
    pub fn evicted_count(&self) -> u64 {
        self.evicted
    }
}
