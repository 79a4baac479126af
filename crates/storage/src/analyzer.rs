//! Reference live analyzer
//!
//! Produces a per-channel summary artifact from a raw ADC window. Stands in
//! for the heavyweight toolkit analyses (PSD, coherence) the production
//! deployment plugs in behind the same trait.

use std::collections::HashMap;

use bytes::Bytes;
use chrono::Utc;

use codec::adc_to_volts;
use contracts::{AnalysisResult, SignalAnalyzer, TelemetryError, CHANNEL_COUNT};

const ANALYZER_NAME: &str = "summary";

/// Computes mean/min/max voltage per channel, emitted as one JSON artifact
/// named `"summary"`.
#[derive(Debug, Clone, Default)]
pub struct SummaryAnalyzer;

impl SummaryAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl SignalAnalyzer for SummaryAnalyzer {
    fn name(&self) -> &str {
        ANALYZER_NAME
    }

    fn analyze(
        &self,
        window: &[[u16; CHANNEL_COUNT]],
        sample_rate: u32,
        channel_names: &[String],
    ) -> Result<AnalysisResult, TelemetryError> {
        if window.is_empty() {
            return Err(TelemetryError::analyzer(ANALYZER_NAME, "empty window"));
        }
        if channel_names.len() != CHANNEL_COUNT {
            return Err(TelemetryError::analyzer(
                ANALYZER_NAME,
                format!("expected {CHANNEL_COUNT} channel names, got {}", channel_names.len()),
            ));
        }

        let mut summary = HashMap::with_capacity(CHANNEL_COUNT);
        for (ch, name) in channel_names.iter().enumerate() {
            let mut sum = 0.0f64;
            let mut min = f64::INFINITY;
            let mut max = f64::NEG_INFINITY;
            for sample in window {
                let volts = adc_to_volts(sample[ch]);
                sum += volts;
                min = min.min(volts);
                max = max.max(volts);
            }
            summary.insert(
                name.clone(),
                serde_json::json!({
                    "mean_volts": sum / window.len() as f64,
                    "min_volts": min,
                    "max_volts": max,
                }),
            );
        }

        let artifact = serde_json::json!({
            "sample_rate": sample_rate,
            "window_samples": window.len(),
            "channels": summary,
        });
        let encoded = serde_json::to_vec(&artifact)
            .map_err(|e| TelemetryError::analyzer(ANALYZER_NAME, e.to_string()))?;

        let mut artifacts = HashMap::new();
        artifacts.insert(ANALYZER_NAME.to_string(), Bytes::from(encoded));
        Ok(AnalysisResult {
            artifacts,
            generated_at: Some(Utc::now()),
        })
    }
}
