//! Ingestion metrics

use std::sync::atomic::{AtomicU64, Ordering};

/// Shared ingestion counters
///
/// Process-local atomics for cheap snapshots; the same events also go to the
/// `metrics` recorder for export.
#[derive(Debug, Default)]
pub struct IngestMetrics {
    /// Messages pulled off the queue
    pub messages_received: AtomicU64,

    /// Messages acked after successful dual-write
    pub messages_acked: AtomicU64,

    /// Messages nacked for redelivery
    pub messages_retried: AtomicU64,

    /// Malformed messages acked and dropped
    pub messages_dropped: AtomicU64,

    /// Samples appended to live windows
    pub samples_ingested: AtomicU64,
}

impl IngestMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_received(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("neurowire_ingest_messages_received_total").increment(1);
    }

    pub fn record_acked(&self, samples: usize) {
        self.messages_acked.fetch_add(1, Ordering::Relaxed);
        self.samples_ingested
            .fetch_add(samples as u64, Ordering::Relaxed);
        metrics::counter!("neurowire_ingest_messages_total", "disposition" => "ack").increment(1);
        metrics::counter!("neurowire_ingest_samples_total").increment(samples as u64);
    }

    pub fn record_retried(&self) {
        self.messages_retried.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("neurowire_ingest_messages_total", "disposition" => "retry").increment(1);
    }

    pub fn record_dropped(&self) {
        self.messages_dropped.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("neurowire_ingest_messages_total", "disposition" => "drop").increment(1);
    }

    /// Consistent-enough snapshot for logging
    pub fn snapshot(&self) -> IngestSnapshot {
        IngestSnapshot {
            messages_received: self.messages_received.load(Ordering::Relaxed),
            messages_acked: self.messages_acked.load(Ordering::Relaxed),
            messages_retried: self.messages_retried.load(Ordering::Relaxed),
            messages_dropped: self.messages_dropped.load(Ordering::Relaxed),
            samples_ingested: self.samples_ingested.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestSnapshot {
    pub messages_received: u64,
    pub messages_acked: u64,
    pub messages_retried: u64,
    pub messages_dropped: u64,
    pub samples_ingested: u64,
}
