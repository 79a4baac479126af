//! `export` command implementation.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use contracts::JobState;
use export::{ExportService, JobRegistry};
use storage::{FsChunkStore, FsDatasetWriter, JsonMetadataStore};

use crate::cli::ExportArgs;
use crate::error::CliError;

/// Execute the `export` command
///
/// Submits one export job against the local data directory and polls its
/// status until it reaches a terminal state.
pub async fn run_export(args: &ExportArgs) -> Result<()> {
    info!(config = %args.config.display(), dataset = %args.dataset, "Loading configuration");

    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    let chunk_store = Arc::new(FsChunkStore::new(&args.data_dir, &blueprint.ingest.bucket));
    let metadata_store = Arc::new(JsonMetadataStore::new(args.data_dir.join("metadata")));
    let writer = Arc::new(FsDatasetWriter::new());

    tokio::fs::create_dir_all(&blueprint.export.output_dir)
        .await
        .with_context(|| {
            format!(
                "Failed to create output dir {}",
                blueprint.export.output_dir.display()
            )
        })?;

    let service = ExportService::new(
        chunk_store,
        metadata_store,
        writer,
        JobRegistry::new(),
        blueprint.stream.clone(),
        blueprint.export.clone(),
    );

    let job_id = service.submit(&args.dataset);
    println!("Export job submitted: {job_id}");

    let submitted_at = std::time::Instant::now();
    let poll_interval = Duration::from_millis(args.poll_interval_ms.max(50));
    let mut last_message = String::new();

    loop {
        tokio::time::sleep(poll_interval).await;

        let Some(status) = service.status(&job_id) else {
            return Err(CliError::export_failed("job vanished from registry").into());
        };

        if status.message != last_message {
            println!("[{:>3}%] {}", status.progress, status.message);
            last_message = status.message.clone();
        }

        match status.state {
            JobState::Completed => {
                observability::record_export_job_outcome(
                    "completed",
                    submitted_at.elapsed().as_secs_f64(),
                );
                let locator = status.result_locator.unwrap_or_default();
                println!(
                    "Export completed: {}",
                    blueprint.export.output_dir.join(locator).display()
                );
                return Ok(());
            }
            JobState::Failed => {
                observability::record_export_job_outcome(
                    "failed",
                    submitted_at.elapsed().as_secs_f64(),
                );
                return Err(CliError::export_failed(status.message).into());
            }
            JobState::Pending | JobState::Running => {}
        }
    }
}
