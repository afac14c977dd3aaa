//! Schema models
//!
//! The schema subsystem maps a record kind to a physical storage model. The
//! dispatcher only asks for a model once per kind and hands it to the worker.

use serde::Serialize;
use std::sync::Arc;

use crate::{ContractError, Downsampling, ScopeId, StreamName};

/// Storage attributes requested for a model
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorageDescriptor {
    /// Model name
    pub name: StreamName,
    /// Counted towards storage capacity tracking
    pub capacity_tracked: bool,
    /// Rows are retained individually and expire by TTL
    pub retained_individually: bool,
    /// Retention granularity
    pub downsampling: Downsampling,
}

impl StorageDescriptor {
    /// Record-like storage: capacity tracked, individually retained
    pub fn record_like(name: StreamName, downsampling: Downsampling) -> Self {
        Self {
            name,
            capacity_tracked: true,
            retained_individually: true,
            downsampling,
        }
    }
}

/// Physical storage model of a record kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Model {
    pub name: StreamName,
    /// Record kind the model was registered for
    pub kind: &'static str,
    pub scope_id: ScopeId,
    pub downsampling: Downsampling,
    pub capacity_tracked: bool,
    pub retained_individually: bool,
    /// Model stores individual records rather than aggregates
    pub record: bool,
}

impl Model {
    pub fn new(
        kind: &'static str,
        scope_id: ScopeId,
        storage: StorageDescriptor,
        record: bool,
    ) -> Self {
        Self {
            name: storage.name,
            kind,
            scope_id,
            downsampling: storage.downsampling,
            capacity_tracked: storage.capacity_tracked,
            retained_individually: storage.retained_individually,
            record,
        }
    }
}

/// Schema registration service
pub trait ModelRegistry: Send + Sync {
    /// Register a model, or return the existing one for the same name and kind.
    ///
    /// # Errors
    /// [`ContractError::ModelConflict`] when the name belongs to another kind.
    fn put_if_absent(
        &self,
        kind: &'static str,
        scope_id: ScopeId,
        storage: StorageDescriptor,
        record: bool,
    ) -> Result<Arc<Model>, ContractError>;

    /// All registered models, in registration order
    fn models(&self) -> Vec<Arc<Model>>;
}
