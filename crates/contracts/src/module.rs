//! ModuleContext - service lookup handed to registration
//!
//! Services are resolved by [`ServiceRole`]; a missing service is a
//! configuration error surfaced at startup.

use std::fmt;
use std::sync::Arc;

use crate::{ContractError, ModelRegistry, StorageDao, WorkerConfig};

/// Role of a service provided through the module context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceRole {
    /// Storage module DAO factory
    StorageDao,
    /// Core module schema registration
    ModelRegistry,
}

impl fmt::Display for ServiceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StorageDao => f.write_str("storage.dao"),
            Self::ModelRegistry => f.write_str("core.model_registry"),
        }
    }
}

/// Services and settings shared by all none-stream workers
#[derive(Clone, Default)]
pub struct ModuleContext {
    storage: Option<Arc<dyn StorageDao>>,
    models: Option<Arc<dyn ModelRegistry>>,
    worker: WorkerConfig,
}

impl ModuleContext {
    pub fn builder() -> ModuleContextBuilder {
        ModuleContextBuilder::default()
    }

    /// Resolve the storage DAO factory
    pub fn storage_dao(&self) -> Result<Arc<dyn StorageDao>, ContractError> {
        self.storage
            .clone()
            .ok_or(ContractError::ServiceNotFound {
                role: ServiceRole::StorageDao,
            })
    }

    /// Resolve the schema registration service
    pub fn model_registry(&self) -> Result<Arc<dyn ModelRegistry>, ContractError> {
        self.models
            .clone()
            .ok_or(ContractError::ServiceNotFound {
                role: ServiceRole::ModelRegistry,
            })
    }

    /// Settings for persistent workers
    pub fn worker_config(&self) -> &WorkerConfig {
        &self.worker
    }
}

impl fmt::Debug for ModuleContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleContext")
            .field("storage", &self.storage.as_ref().map(|s| s.name().to_string()))
            .field("models", &self.models.is_some())
            .field("worker", &self.worker)
            .finish()
    }
}

/// Builder for [`ModuleContext`]
#[derive(Default)]
pub struct ModuleContextBuilder {
    context: ModuleContext,
}

impl ModuleContextBuilder {
    pub fn storage(mut self, storage: Arc<dyn StorageDao>) -> Self {
        self.context.storage = Some(storage);
        self
    }

    pub fn models(mut self, models: Arc<dyn ModelRegistry>) -> Self {
        self.context.models = Some(models);
        self
    }

    pub fn worker(mut self, worker: WorkerConfig) -> Self {
        self.context.worker = worker;
        self
    }

    pub fn build(self) -> ModuleContext {
        self.context
    }
}
