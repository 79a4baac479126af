//! `run` command implementation.

use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::pipeline::{Pipeline, PipelineConfig};

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    info!(
        sample_rate = blueprint.stream.sample_rate,
        channels = blueprint.stream.channel_names.len(),
        bucket = %blueprint.ingest.bucket,
        queue_capacity = blueprint.ingest.queue_capacity,
        "Configuration loaded"
    );

    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint);
        return Ok(());
    }

    let pipeline_config = PipelineConfig {
        blueprint,
        data_dir: args.data_dir.clone(),
        devices: args.devices.max(1),
        consumers: args.consumers.max(1),
        duration: if args.duration == 0 {
            None
        } else {
            Some(Duration::from_secs(args.duration))
        },
        metrics_port: if args.metrics_port == 0 {
            None
        } else {
            Some(args.metrics_port)
        },
    };

    let pipeline = Pipeline::new(pipeline_config);
    let shutdown_signal = setup_shutdown_signal();

    info!("Starting pipeline...");

    tokio::select! {
        result = pipeline.run() => {
            match result {
                Ok(stats) => {
                    info!(
                        messages_acked = stats.ingest.messages_acked,
                        samples_ingested = stats.ingest.samples_ingested,
                        duration_secs = stats.duration.as_secs_f64(),
                        "Pipeline completed successfully"
                    );
                    stats.print_summary();
                }
                Err(e) => {
                    return Err(e).context("Pipeline execution failed");
                }
            }
        }
        _ = shutdown_signal => {
            warn!("Received shutdown signal, stopping pipeline...");
        }
    }

    info!("Neurowire finished");
    Ok(())
}

/// Setup Ctrl+C and SIGTERM signal handlers
async fn setup_shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &contracts::TelemetryBlueprint) {
    println!("\n=== Configuration Summary ===\n");
    println!("Stream:");
    println!("  Sample rate: {} Hz", blueprint.stream.sample_rate);
    println!("  Channels: {}", blueprint.stream.channel_names.join(", "));
    println!("  Buffer retention: {}s", blueprint.stream.buffer_max_secs);
    println!(
        "  Analysis: {}s window every {}s",
        blueprint.stream.analysis_window_secs, blueprint.stream.analysis_interval_secs
    );
    println!("\nIngest:");
    println!("  Bucket: {}", blueprint.ingest.bucket);
    println!("  Key prefix: {}", blueprint.ingest.key_prefix);
    println!("  Queue capacity: {}", blueprint.ingest.queue_capacity);
    println!("\nExport:");
    println!("  Output dir: {}", blueprint.export.output_dir.display());
    println!("  Fetch concurrency: {}", blueprint.export.fetch_concurrency);
    println!();
}
