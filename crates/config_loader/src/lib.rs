//! # Config Loader
//!
//! Configuration loading and parsing.
//!
//! Responsibilities:
//! - Parse TOML/JSON configuration files
//! - Validate configuration legality
//! - Produce a [`TelemetryBlueprint`]
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let blueprint = ConfigLoader::load_from_path(Path::new("config.toml")).unwrap();
//! println!("Sample rate: {}", blueprint.stream.sample_rate);
//! ```

mod parser;
mod validator;

pub use contracts::TelemetryBlueprint;
pub use parser::ConfigFormat;
pub use validator::validate;

use contracts::TelemetryError;
use std::path::Path;

/// Configuration loader
///
/// Static methods to load configuration from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a file path
    ///
    /// Detects the format from the file extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<TelemetryBlueprint, TelemetryError> {
        let format = Self::detect_format(path)?;
        let content = std::fs::read_to_string(path).map_err(|e| {
            TelemetryError::config_parse(format!("read {}: {e}", path.display()))
        })?;
        Self::load_from_str(&content, format)
    }

    /// Load configuration from a string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<TelemetryBlueprint, TelemetryError> {
        let blueprint = parser::parse(content, format)?;
        validator::validate(&blueprint)?;
        Ok(blueprint)
    }

    /// Serialize a blueprint to a TOML string
    pub fn to_toml(blueprint: &TelemetryBlueprint) -> Result<String, TelemetryError> {
        toml::to_string_pretty(blueprint)
            .map_err(|e| TelemetryError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize a blueprint to a JSON string
    pub fn to_json(blueprint: &TelemetryBlueprint) -> Result<String, TelemetryError> {
        serde_json::to_string_pretty(blueprint)
            .map_err(|e| TelemetryError::config_parse(format!("JSON serialize error: {e}")))
    }

    fn detect_format(path: &Path) -> Result<ConfigFormat, TelemetryError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            TelemetryError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            TelemetryError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }
}
