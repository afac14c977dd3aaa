//! NoneStreamDispatcher - routes none-stream records to per-kind workers
//!
//! Each record kind is bound to exactly one [`PersistentWorker`] during
//! startup. After startup the registry is read-only, so the dispatcher is
//! shared as `Arc<NoneStreamDispatcher>` and `dispatch` never takes a lock.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use contracts::{
    DisableRegistry, ModuleContext, NoneStream, StorageDescriptor, StreamDefinition, StreamName,
};
use observability::metrics as obs;

use crate::error::DispatcherError;
use crate::metrics::MetricsSnapshot;
use crate::worker::{NoneStreamAccessor, PersistentWorker, RecordWorker};

/// Outcome of a registration call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// A worker was created and bound to the kind
    Bound,
    /// A worker was created and replaced the kind's previous binding
    Replaced,
    /// The stream is disabled; nothing was created
    Disabled,
}

impl Registration {
    /// Label used for the registration metric
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bound => "bound",
            Self::Replaced => "replaced",
            Self::Disabled => "disabled",
        }
    }
}

/// Type-routed dispatcher for none-stream records
pub struct NoneStreamDispatcher {
    disabled: Arc<DisableRegistry>,
    workers: HashMap<&'static str, Arc<dyn RecordWorker>>,
}

impl NoneStreamDispatcher {
    pub fn new(disabled: Arc<DisableRegistry>) -> Self {
        Self {
            disabled,
            workers: HashMap::new(),
        }
    }

    /// Bind record kind `R` to a new persistent worker.
    ///
    /// Startup-only: call once per kind from one thread, inside a Tokio
    /// runtime. Registering a kind again replaces its binding and returns
    /// [`Registration::Replaced`].
    ///
    /// # Errors
    /// Missing module services, a failing storage builder or DAO, or a model
    /// name conflict. All of them should abort startup.
    #[instrument(
        name = "none_stream_register",
        skip(self, definition, ctx),
        fields(kind = R::KIND, stream = %definition.descriptor.name)
    )]
    pub fn register<R: NoneStream>(
        &mut self,
        definition: StreamDefinition<R>,
        ctx: &ModuleContext,
    ) -> Result<Registration, DispatcherError> {
        let descriptor = definition.descriptor;
        let stream = descriptor.name.clone();

        if self.disabled.include(&stream) {
            info!(stream = %stream, kind = R::KIND, "Stream disabled, registration skipped");
            obs::record_registration(&stream, Registration::Disabled.as_str());
            return Ok(Registration::Disabled);
        }

        let storage = ctx
            .storage_dao()
            .map_err(|e| DispatcherError::registration(stream.as_str(), e))?;
        let builder = (definition.builder)()
            .map_err(|e| DispatcherError::storage_accessor(stream.as_str(), R::KIND, e))?;
        let dao = storage
            .new_none_stream_dao(&descriptor)
            .map_err(|e| DispatcherError::storage_accessor(stream.as_str(), R::KIND, e))?;

        let model = ctx
            .model_registry()
            .and_then(|models| {
                models.put_if_absent(
                    R::KIND,
                    descriptor.scope_id,
                    StorageDescriptor::record_like(stream.clone(), descriptor.downsampling),
                    true,
                )
            })
            .map_err(|e| DispatcherError::registration(stream.as_str(), e))?;

        let worker = PersistentWorker::new(ctx, model, NoneStreamAccessor::new(builder, dao));
        let outcome = if self.workers.insert(R::KIND, Arc::new(worker)).is_some() {
            warn!(stream = %stream, kind = R::KIND, "Kind registered twice, previous worker replaced");
            Registration::Replaced
        } else {
            Registration::Bound
        };

        info!(
            stream = %stream,
            kind = R::KIND,
            storage = storage.name(),
            "Persistent worker bound"
        );
        obs::record_registration(&stream, outcome.as_str());
        Ok(outcome)
    }

    /// Forward a record to its worker.
    ///
    /// Returns false, with no other effect, when the kind has no binding
    /// (never registered or disabled).
    pub fn dispatch<R: NoneStream>(&self, record: R) -> bool {
        let Some(worker) = self.workers.get(R::KIND) else {
            debug!(kind = R::KIND, "No worker bound, record ignored");
            obs::record_unrouted(R::KIND);
            return false;
        };

        obs::record_dispatched(worker.stream());
        worker.intake(Box::new(record));
        true
    }

    /// Whether `kind` has a worker binding
    pub fn is_bound(&self, kind: &str) -> bool {
        self.workers.contains_key(kind)
    }

    /// Worker bound to `kind`
    pub fn worker(&self, kind: &str) -> Option<Arc<dyn RecordWorker>> {
        self.workers.get(kind).cloned()
    }

    /// Streams with a worker binding, sorted
    pub fn bound_streams(&self) -> Vec<StreamName> {
        let mut streams: Vec<_> = self.workers.values().map(|w| w.stream().clone()).collect();
        streams.sort();
        streams
    }

    /// Metrics for all workers, sorted by stream
    pub fn metrics(&self) -> Vec<(StreamName, MetricsSnapshot)> {
        let mut metrics: Vec<_> = self
            .workers
            .values()
            .map(|w| (w.stream().clone(), w.metrics().snapshot()))
            .collect();
        metrics.sort_by(|a, b| a.0.cmp(&b.0));
        metrics
    }

    /// Drain every worker queue; bindings stay in place.
    ///
    /// Intended for process exit. Records dispatched afterwards are dropped
    /// by the stopped workers.
    #[instrument(name = "none_stream_dispatcher_shutdown", skip(self))]
    pub async fn shutdown(&self) {
        for worker in self.workers.values() {
            worker.shutdown().await;
        }
        info!(workers = self.workers.len(), "Dispatcher shutdown complete");
    }
}
