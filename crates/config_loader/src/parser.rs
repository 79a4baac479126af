//! Configuration parsing
//!
//! TOML (primary) and JSON (optional) formats.

use contracts::{TelemetryBlueprint, TelemetryError};

/// Configuration file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML (recommended)
    Toml,
    /// JSON
    Json,
}

impl ConfigFormat {
    /// Infer the format from a file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Parse TOML configuration
pub fn parse_toml(content: &str) -> Result<TelemetryBlueprint, TelemetryError> {
    toml::from_str(content).map_err(|e| TelemetryError::ConfigParse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// Parse JSON configuration
pub fn parse_json(content: &str) -> Result<TelemetryBlueprint, TelemetryError> {
    serde_json::from_str(content).map_err(|e| TelemetryError::ConfigParse {
        message: format!("JSON parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// Parse configuration in the given format
pub fn parse(content: &str, format: ConfigFormat) -> Result<TelemetryBlueprint, TelemetryError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_toml_defaults_fill_in() {
        // Sections are optional; defaults cover anything omitted
        let blueprint = parse_toml("[stream]\nsample_rate = 512\n").unwrap();
        assert_eq!(blueprint.stream.sample_rate, 512);
        assert_eq!(blueprint.ingest.bucket, "raw-data");
    }

    #[test]
    fn test_parse_json_minimal() {
        let content = r#"{
            "stream": {
                "sample_rate": 256,
                "channel_names": ["Fp1", "Fp2", "F7", "F8", "T7", "T8", "P7", "P8"],
                "buffer_max_secs": 30.0,
                "analysis_window_secs": 5.0,
                "analysis_interval_secs": 5.0
            }
        }"#;
        let blueprint = parse_json(content).unwrap();
        assert_eq!(blueprint.stream.buffer_max_secs, 30.0);
    }

    #[test]
    fn test_parse_toml_syntax_error() {
        let err = parse_toml("invalid toml [[[").unwrap_err();
        assert!(matches!(err, TelemetryError::ConfigParse { .. }));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            ConfigFormat::from_extension("toml"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("TOML"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("json"),
            Some(ConfigFormat::Json)
        );
        assert_eq!(ConfigFormat::from_extension("yaml"), None);
    }
}
