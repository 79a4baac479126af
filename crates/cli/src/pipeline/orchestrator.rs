//! Pipeline orchestrator - wires mock devices, the ingest queue, consumers
//! and the live analysis cycle together for one run.

use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::{info, warn};

use contracts::{ChunkStore, TelemetryBlueprint};
use ingestion::{run_consumer, IngestDriver, MockDeviceConfig, MockDeviceSource};
use observability::StatsSummary;
use storage::{FsChunkStore, JsonMetadataStore, SummaryAnalyzer};
use window_store::WindowStore;

use super::analysis::{run_analysis_cycle, AnalysisCounters};
use super::PipelineStats;

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// The telemetry blueprint configuration
    pub blueprint: TelemetryBlueprint,

    /// Data directory for stored chunks and metadata
    pub data_dir: PathBuf,

    /// Number of mock devices to run
    pub devices: usize,

    /// Number of ingest consumers
    pub consumers: usize,

    /// Run duration (None = until cancelled from outside)
    pub duration: Option<Duration>,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run the pipeline to completion
    pub async fn run(self) -> Result<PipelineStats> {
        let start_time = Instant::now();
        let blueprint = &self.config.blueprint;

        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        // Storage collaborators over the local data directory
        let chunk_store = Arc::new(FsChunkStore::new(
            &self.config.data_dir,
            &blueprint.ingest.bucket,
        ));
        chunk_store
            .ensure_bucket()
            .await
            .context("Failed to create bucket directory")?;
        let metadata_store = Arc::new(JsonMetadataStore::new(self.config.data_dir.join("metadata")));

        let window_store = Arc::new(WindowStore::from_config(&blueprint.stream));
        let driver = Arc::new(IngestDriver::new(
            chunk_store,
            metadata_store,
            window_store.clone(),
            blueprint.ingest.clone(),
        ));
        let ingest_metrics = driver.metrics();

        // Bounded queue between devices and consumers
        let (tx, rx) = async_channel::bounded(blueprint.ingest.queue_capacity);
        let retry_backoff = Duration::from_secs_f64(blueprint.ingest.retry_backoff_secs);

        let mut consumer_handles = Vec::with_capacity(self.config.consumers);
        for _ in 0..self.config.consumers {
            consumer_handles.push(tokio::spawn(run_consumer(
                rx.clone(),
                driver.clone(),
                retry_backoff,
            )));
        }

        let sources: Vec<MockDeviceSource> = (0..self.config.devices)
            .map(|i| {
                MockDeviceSource::new(MockDeviceConfig {
                    device_id: format!("mock:00:{i:02x}"),
                    user_id: format!("subject-{}", i + 1).into(),
                    sample_rate: blueprint.stream.sample_rate,
                    batch_size: 64,
                })
            })
            .collect();
        for source in &sources {
            source.start(tx.clone());
        }
        drop(tx);

        info!(
            devices = sources.len(),
            consumers = self.config.consumers,
            "Pipeline running (mock devices)"
        );

        // Live analysis off the ingest hot path
        let counters = Arc::new(AnalysisCounters::default());
        let analysis_handle = tokio::spawn(run_analysis_cycle(
            window_store.clone(),
            Arc::new(SummaryAnalyzer::new()),
            blueprint.stream.clone(),
            counters.clone(),
        ));

        match self.config.duration {
            Some(duration) => tokio::time::sleep(duration).await,
            None => std::future::pending::<()>().await,
        }

        // Shutdown: stop devices, let consumers drain the closed channel
        info!("Shutting down pipeline...");
        for source in &sources {
            source.stop();
        }
        analysis_handle.abort();

        for handle in consumer_handles {
            if tokio::time::timeout(Duration::from_secs(5), handle)
                .await
                .is_err()
            {
                warn!("Consumer did not drain within shutdown timeout");
            }
        }

        let stats = PipelineStats {
            duration: start_time.elapsed(),
            active_devices: sources.len(),
            active_consumers: self.config.consumers,
            ingest: ingest_metrics.snapshot(),
            store: window_store.stats(),
            analysis_cycles: counters.cycles.load(Ordering::Relaxed),
            analysis_failures: counters.failures.load(Ordering::Relaxed),
            analysis_duration_ms: StatsSummary::from(&counters.durations()),
        };

        info!(
            duration_secs = stats.duration.as_secs_f64(),
            samples_per_sec = format!("{:.1}", stats.samples_per_sec()),
            "Pipeline shutdown complete"
        );

        Ok(stats)
    }
}
