//! Dispatcher error types

use thiserror::Error;

/// Registration and storage setup errors.
///
/// All variants are fatal: startup aborts instead of running with
/// unroutable record kinds.
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Storage accessor could not be created for a record kind
    #[error("failed to create storage accessor for stream '{stream}' (kind '{kind}'): {source}")]
    StorageAccessor {
        stream: String,
        kind: &'static str,
        #[source]
        source: contracts::ContractError,
    },

    /// Module service or schema registration failed
    #[error("failed to register stream '{stream}': {source}")]
    Registration {
        stream: String,
        #[source]
        source: contracts::ContractError,
    },

    /// Storage backend creation error
    #[error("failed to create storage backend '{backend}': {message}")]
    StorageCreation { backend: String, message: String },
}

impl DispatcherError {
    /// Create a storage accessor error
    pub fn storage_accessor(
        stream: impl Into<String>,
        kind: &'static str,
        source: contracts::ContractError,
    ) -> Self {
        Self::StorageAccessor {
            stream: stream.into(),
            kind,
            source,
        }
    }

    /// Create a registration error
    pub fn registration(stream: impl Into<String>, source: contracts::ContractError) -> Self {
        Self::Registration {
            stream: stream.into(),
            source,
        }
    }

    /// Create a storage creation error
    pub fn storage_creation(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StorageCreation {
            backend: backend.into(),
            message: message.into(),
        }
    }
}
