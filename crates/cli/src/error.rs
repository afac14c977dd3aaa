//! Error types for CLI operations.

use thiserror::Error;

use dispatcher::DispatcherError;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Input file could not be opened
    #[error("Failed to open input {path}: {source}")]
    InputOpen {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Input line is not a `{"kind", "record"}` envelope, or the record does not match its kind
    #[error("Malformed record for kind '{kind}': {message}")]
    RecordParse { kind: String, message: String },

    /// Stream registration failed during startup
    #[error("Bootstrap failed: {0}")]
    Bootstrap(#[from] DispatcherError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn input_open(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::InputOpen {
            path: path.into(),
            source,
        }
    }

    pub fn record_parse(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RecordParse {
            kind: kind.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
