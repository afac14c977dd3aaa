//! Layered error definitions
//!
//! Categorized by source: config / module / schema / storage

use thiserror::Error;

use crate::ServiceRole;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
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

    // ===== Module Errors =====
    /// Service not provided by the module context
    #[error("service not found in module context: {role}")]
    ServiceNotFound { role: ServiceRole },

    // ===== Schema Errors =====
    /// Model name already taken by another record kind
    #[error("model '{name}' is already registered for kind '{existing}', cannot register '{requested}'")]
    ModelConflict {
        name: String,
        existing: String,
        requested: String,
    },

    // ===== Storage Errors =====
    /// Storage builder could not be created for a record kind
    #[error("storage builder error for '{kind}': {message}")]
    StorageBuilder { kind: String, message: String },

    /// Record could not be converted to or from its storage form
    #[error("record conversion error for '{kind}': {message}")]
    RecordConversion { kind: String, message: String },

    /// Storage write error
    #[error("storage '{model}' write error: {message}")]
    StorageWrite { model: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
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

    /// Create storage builder error
    pub fn storage_builder(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StorageBuilder {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// Create record conversion error
    pub fn record_conversion(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RecordConversion {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// Create storage write error
    pub fn storage_write(model: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StorageWrite {
            model: model.into(),
            message: message.into(),
        }
    }
}
