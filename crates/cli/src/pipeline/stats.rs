//! Pipeline statistics.

use std::time::Duration;

use ingestion::IngestSnapshot;
use observability::StatsSummary;
use window_store::StoreStats;

/// Statistics from a pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Total duration of the pipeline run
    pub duration: Duration,

    /// Number of mock devices that were emitting
    pub active_devices: usize,

    /// Number of ingest consumers draining the queue
    pub active_consumers: usize,

    /// Final ingestion counters
    pub ingest: IngestSnapshot,

    /// Final window store counters
    pub store: StoreStats,

    /// Completed analysis cycles across all users
    pub analysis_cycles: u64,

    /// Analysis invocations that failed (previous result kept)
    pub analysis_failures: u64,

    /// Analysis call duration distribution (milliseconds)
    pub analysis_duration_ms: StatsSummary,
}

impl PipelineStats {
    /// Samples ingested per second of wall-clock runtime
    pub fn samples_per_sec(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.ingest.samples_ingested as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n=== Pipeline Statistics ===\n");

        println!("Overview");
        println!("  Duration: {:.2}s", self.duration.as_secs_f64());
        println!("  Devices: {}", self.active_devices);
        println!("  Consumers: {}", self.active_consumers);

        println!("\nIngestion");
        println!("  Messages received: {}", self.ingest.messages_received);
        println!("  Messages acked: {}", self.ingest.messages_acked);
        println!("  Messages retried: {}", self.ingest.messages_retried);
        println!("  Messages dropped: {}", self.ingest.messages_dropped);
        println!(
            "  Samples ingested: {} ({:.1}/s)",
            self.ingest.samples_ingested,
            self.samples_per_sec()
        );

        println!("\nLive windows");
        println!("  Users: {}", self.store.users);
        println!("  Samples appended: {}", self.store.samples_appended);
        println!("  Samples evicted: {}", self.store.samples_evicted);

        println!("\nAnalysis");
        println!("  Cycles completed: {}", self.analysis_cycles);
        println!("  Failures: {}", self.analysis_failures);
        println!("  Call duration (ms): {}", self.analysis_duration_ms);

        println!();
    }
}
