//! Error types for CLI operations.

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Export job error
    #[error("Export job failed: {message}")]
    ExportFailed { message: String },
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn export_failed(message: impl Into<String>) -> Self {
        Self::ExportFailed {
            message: message.into(),
        }
    }
}
