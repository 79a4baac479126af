//! `info` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    stream: StreamInfo,
    ingest: IngestInfo,
    export: ExportInfo,
}

#[derive(Serialize)]
struct StreamInfo {
    sample_rate: u32,
    channel_names: Vec<String>,
    buffer_max_secs: f64,
    analysis_window_secs: f64,
    analysis_interval_secs: f64,
    buffer_capacity_samples: usize,
}

#[derive(Serialize)]
struct IngestInfo {
    bucket: String,
    key_prefix: String,
    queue_capacity: usize,
    retry_backoff_secs: f64,
}

#[derive(Serialize)]
struct ExportInfo {
    output_dir: String,
    fetch_concurrency: usize,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_config_info(&blueprint);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&blueprint);
    }

    Ok(())
}

fn build_config_info(blueprint: &contracts::TelemetryBlueprint) -> ConfigInfo {
    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        stream: StreamInfo {
            sample_rate: blueprint.stream.sample_rate,
            channel_names: blueprint.stream.channel_names.clone(),
            buffer_max_secs: blueprint.stream.buffer_max_secs,
            analysis_window_secs: blueprint.stream.analysis_window_secs,
            analysis_interval_secs: blueprint.stream.analysis_interval_secs,
            buffer_capacity_samples: blueprint.stream.buffer_capacity(),
        },
        ingest: IngestInfo {
            bucket: blueprint.ingest.bucket.clone(),
            key_prefix: blueprint.ingest.key_prefix.clone(),
            queue_capacity: blueprint.ingest.queue_capacity,
            retry_backoff_secs: blueprint.ingest.retry_backoff_secs,
        },
        export: ExportInfo {
            output_dir: blueprint.export.output_dir.display().to_string(),
            fetch_concurrency: blueprint.export.fetch_concurrency,
        },
    }
}

fn print_config_info(blueprint: &contracts::TelemetryBlueprint) {
    println!("=== Neurowire Configuration ===\n");

    println!("Stream");
    println!("  Version: {:?}", blueprint.version);
    println!("  Sample rate: {} Hz", blueprint.stream.sample_rate);
    println!("  Channels: {}", blueprint.stream.channel_names.join(", "));
    println!(
        "  Buffer retention: {}s ({} samples)",
        blueprint.stream.buffer_max_secs,
        blueprint.stream.buffer_capacity()
    );
    println!(
        "  Analysis: {}s window every {}s",
        blueprint.stream.analysis_window_secs, blueprint.stream.analysis_interval_secs
    );

    println!("\nIngest");
    println!("  Bucket: {}", blueprint.ingest.bucket);
    println!("  Key prefix: {}", blueprint.ingest.key_prefix);
    println!("  Queue capacity: {}", blueprint.ingest.queue_capacity);
    println!(
        "  Retry backoff: {}s",
        blueprint.ingest.retry_backoff_secs
    );

    println!("\nExport");
    println!("  Output dir: {}", blueprint.export.output_dir.display());
    println!(
        "  Fetch concurrency: {}",
        blueprint.export.fetch_concurrency
    );

    println!();
}
