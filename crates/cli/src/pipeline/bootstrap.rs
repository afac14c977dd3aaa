//! Composition root: storage, model registry, disable list and stream registration.

use std::sync::Arc;
use tracing::info;

use contracts::{DisableRegistry, IngestConfig, ModuleContext};
use dispatcher::{create_storage, NoneStreamDispatcher, Registration, StorageModels};

use super::catalog;
use crate::error::Result;

/// Started ingestion runtime
pub struct Runtime {
    pub dispatcher: NoneStreamDispatcher,
    /// Registration outcome per built-in kind, in catalog order
    pub registrations: Vec<(&'static str, Registration)>,
}

/// Build the module context from `config` and register every built-in stream.
///
/// Must run inside a Tokio runtime, since bound workers spawn their tasks.
pub fn bootstrap(config: &IngestConfig) -> Result<Runtime> {
    let storage = create_storage(&config.storage)?;
    let context = ModuleContext::builder()
        .storage(storage)
        .models(Arc::new(StorageModels::new()))
        .worker(config.worker.clone())
        .build();

    let disabled = DisableRegistry::from_names(config.disabled_streams.iter().map(String::as_str));
    info!(disabled = disabled.len(), "Disable registry loaded");

    let mut dispatcher = NoneStreamDispatcher::new(Arc::new(disabled));
    let registrations = catalog::register_builtins(&mut dispatcher, &context)?;

    Ok(Runtime {
        dispatcher,
        registrations,
    })
}
