//! `validate` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    sample_rate: u32,
    channel_count: usize,
    buffer_max_secs: f64,
    bucket: String,
    output_dir: String,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    sample_rate: blueprint.stream.sample_rate,
                    channel_count: blueprint.stream.channel_names.len(),
                    buffer_max_secs: blueprint.stream.buffer_max_secs,
                    bucket: blueprint.ingest.bucket.clone(),
                    output_dir: blueprint.export.output_dir.display().to_string(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &contracts::TelemetryBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    if blueprint.ingest.retry_backoff_secs == 0.0 {
        warnings.push(
            "ingest.retry_backoff_secs is 0 - failed messages retry without delay".to_string(),
        );
    }

    if blueprint.ingest.queue_capacity < 10 {
        warnings.push(format!(
            "ingest.queue_capacity is very small ({}) - devices will see backpressure",
            blueprint.ingest.queue_capacity
        ));
    }

    if blueprint.stream.analysis_interval_secs < 1.0 {
        warnings.push(format!(
            "stream.analysis_interval_secs is very short ({}s)",
            blueprint.stream.analysis_interval_secs
        ));
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Sample rate: {} Hz", summary.sample_rate);
            println!("  Channels: {}", summary.channel_count);
            println!("  Buffer retention: {}s", summary.buffer_max_secs);
            println!("  Bucket: {}", summary.bucket);
            println!("  Output dir: {}", summary.output_dir);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
