//! StorageModels - in-memory schema model registry

use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info};

use contracts::{ContractError, Model, ModelRegistry, ScopeId, StorageDescriptor};

/// Registry of storage models in registration order
#[derive(Debug, Default)]
pub struct StorageModels {
    models: RwLock<Vec<Arc<Model>>>,
}

impl StorageModels {
    pub fn new() -> Self {
        Self::default()
    }

    /// Model by name
    pub fn get(&self, name: &str) -> Option<Arc<Model>> {
        self.models
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|m| m.name == name)
            .cloned()
    }
}

impl ModelRegistry for StorageModels {
    fn put_if_absent(
        &self,
        kind: &'static str,
        scope_id: ScopeId,
        storage: StorageDescriptor,
        record: bool,
    ) -> Result<Arc<Model>, ContractError> {
        let mut models = self.models.write().unwrap_or_else(PoisonError::into_inner);

        if let Some(existing) = models.iter().find(|m| m.name == storage.name) {
            if existing.kind != kind {
                return Err(ContractError::ModelConflict {
                    name: storage.name.to_string(),
                    existing: existing.kind.to_string(),
                    requested: kind.to_string(),
                });
            }
            debug!(model = %existing.name, kind, "Model already registered, reusing");
            return Ok(Arc::clone(existing));
        }

        let model = Arc::new(Model::new(kind, scope_id, storage, record));
        info!(
            model = %model.name,
            kind,
            scope = %model.scope_id,
            downsampling = ?model.downsampling,
            "Model registered"
        );
        models.push(Arc::clone(&model));
        Ok(model)
    }

    fn models(&self) -> Vec<Arc<Model>> {
        self.models
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
