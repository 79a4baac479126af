//! Layered error definitions
//!
//! Categorized by source: config / storage / toolkit

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum TelemetryError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Storage Errors =====
    /// Object store error
    #[error("object store error for key '{key}': {message}")]
    ObjectStore { key: String, message: String },

    /// Metadata store error
    #[error("metadata store error: {message}")]
    MetadataStore { message: String },

    // ===== Toolkit Errors =====
    /// Dataset writer error
    #[error("writer '{writer}' failed: {message}")]
    Writer { writer: String, message: String },

    /// Signal analyzer error
    #[error("analyzer '{analyzer}' failed: {message}")]
    Analyzer { analyzer: String, message: String },
}

impl TelemetryError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create object store error
    pub fn object_store(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ObjectStore {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create metadata store error
    pub fn metadata_store(message: impl Into<String>) -> Self {
        Self::MetadataStore {
            message: message.into(),
        }
    }

    /// Create dataset writer error
    pub fn writer(writer: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Writer {
            writer: writer.into(),
            message: message.into(),
        }
    }

    /// Create signal analyzer error
    pub fn analyzer(analyzer: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Analyzer {
            analyzer: analyzer.into(),
            message: message.into(),
        }
    }
}
