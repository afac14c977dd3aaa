//! Storage backends
//!
//! Contains MemoryStorage, FileStorage, and LogStorage.

mod file;
mod log;
mod memory;

pub use self::file::FileStorage;
pub use self::log::LogStorage;
pub use self::memory::MemoryStorage;

use std::sync::Arc;
use tracing::instrument;

use contracts::{StorageBackend, StorageConfig, StorageDao};

use crate::error::DispatcherError;

/// Create the storage module service from configuration
#[instrument(name = "storage_create", skip(config), fields(backend = ?config.backend))]
pub fn create_storage(config: &StorageConfig) -> Result<Arc<dyn StorageDao>, DispatcherError> {
    match config.backend {
        StorageBackend::Memory => Ok(Arc::new(MemoryStorage::new())),
        StorageBackend::Log => Ok(Arc::new(LogStorage::new("log"))),
        StorageBackend::File => {
            let path = config.path.as_ref().ok_or_else(|| {
                DispatcherError::storage_creation("file", "storage.path is required")
            })?;
            let storage = FileStorage::new(path)
                .map_err(|e| DispatcherError::storage_creation("file", e.to_string()))?;
            Ok(Arc::new(storage))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_memory_by_default() {
        let storage = create_storage(&StorageConfig::default()).unwrap();
        assert_eq!(storage.name(), "memory");
    }

    #[test]
    fn test_file_backend_requires_path() {
        let config = StorageConfig {
            backend: StorageBackend::File,
            path: None,
        };
        let err = create_storage(&config).err().unwrap();
        assert!(err.to_string().contains("storage.path"));
    }

    #[test]
    fn test_create_file_backend() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            backend: StorageBackend::File,
            path: Some(dir.path().join("rows")),
        };
        let storage = create_storage(&config).unwrap();
        assert_eq!(storage.name(), "file");
        assert!(dir.path().join("rows").is_dir());
    }
}
