//! Configuration validation
//!
//! Rules:
//! - sample_rate > 0
//! - exactly one channel name per wire channel, all non-empty and unique
//! - buffer/window/interval durations positive, window fits in the buffer
//! - queue_capacity > 0, retry backoff non-negative
//! - fetch_concurrency > 0, key_prefix and bucket non-empty

use std::collections::HashSet;

use contracts::{TelemetryBlueprint, TelemetryError, CHANNEL_COUNT};

/// Validate a blueprint
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(blueprint: &TelemetryBlueprint) -> Result<(), TelemetryError> {
    validate_stream(blueprint)?;
    validate_ingest(blueprint)?;
    validate_export(blueprint)?;
    Ok(())
}

fn validate_stream(blueprint: &TelemetryBlueprint) -> Result<(), TelemetryError> {
    let stream = &blueprint.stream;

    if stream.sample_rate == 0 {
        return Err(TelemetryError::config_validation(
            "stream.sample_rate",
            "sample_rate must be > 0",
        ));
    }

    if stream.channel_names.len() != CHANNEL_COUNT {
        return Err(TelemetryError::config_validation(
            "stream.channel_names",
            format!(
                "expected {CHANNEL_COUNT} channel names, got {}",
                stream.channel_names.len()
            ),
        ));
    }

    let mut seen = HashSet::new();
    for name in &stream.channel_names {
        if name.is_empty() {
            return Err(TelemetryError::config_validation(
                "stream.channel_names",
                "channel names must be non-empty",
            ));
        }
        if !seen.insert(name) {
            return Err(TelemetryError::config_validation(
                format!("stream.channel_names[{name}]"),
                "duplicate channel name",
            ));
        }
    }

    for (field, value) in [
        ("stream.buffer_max_secs", stream.buffer_max_secs),
        ("stream.analysis_window_secs", stream.analysis_window_secs),
        ("stream.analysis_interval_secs", stream.analysis_interval_secs),
    ] {
        if !value.is_finite() || value <= 0.0 {
            return Err(TelemetryError::config_validation(
                field,
                format!("must be a positive duration, got {value}"),
            ));
        }
    }

    if stream.analysis_window_secs > stream.buffer_max_secs {
        return Err(TelemetryError::config_validation(
            "stream.analysis_window_secs",
            format!(
                "analysis window ({}) cannot exceed buffer retention ({})",
                stream.analysis_window_secs, stream.buffer_max_secs
            ),
        ));
    }

    Ok(())
}

fn validate_ingest(blueprint: &TelemetryBlueprint) -> Result<(), TelemetryError> {
    let ingest = &blueprint.ingest;

    if ingest.bucket.is_empty() {
        return Err(TelemetryError::config_validation(
            "ingest.bucket",
            "bucket must be non-empty",
        ));
    }
    if ingest.key_prefix.is_empty() {
        return Err(TelemetryError::config_validation(
            "ingest.key_prefix",
            "key_prefix must be non-empty",
        ));
    }
    if ingest.queue_capacity == 0 {
        return Err(TelemetryError::config_validation(
            "ingest.queue_capacity",
            "queue_capacity must be > 0",
        ));
    }
    if !ingest.retry_backoff_secs.is_finite() || ingest.retry_backoff_secs < 0.0 {
        return Err(TelemetryError::config_validation(
            "ingest.retry_backoff_secs",
            format!("must be non-negative, got {}", ingest.retry_backoff_secs),
        ));
    }

    Ok(())
}

fn validate_export(blueprint: &TelemetryBlueprint) -> Result<(), TelemetryError> {
    let export = &blueprint.export;

    if export.fetch_concurrency == 0 {
        return Err(TelemetryError::config_validation(
            "export.fetch_concurrency",
            "fetch_concurrency must be > 0",
        ));
    }
    if export.output_dir.as_os_str().is_empty() {
        return Err(TelemetryError::config_validation(
            "export.output_dir",
            "output_dir must be non-empty",
        ));
    }

    Ok(())
}
