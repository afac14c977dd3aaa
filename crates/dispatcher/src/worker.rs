//! PersistentWorker - per-stream intake queue and write task

use async_trait::async_trait;
use std::any::Any;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Duration, Instant, Interval, MissedTickBehavior};
use tracing::{debug, error, info, instrument, warn};

use contracts::{
    time_bucket, ContractError, Model, ModuleContext, NoneStream, NoneStreamDao, StorageBuilder,
    StreamName,
};
use observability::metrics as obs;

use crate::metrics::WorkerMetrics;

/// Type-specific storage accessor: record conversion plus the stream's DAO
pub struct NoneStreamAccessor<R> {
    builder: Box<dyn StorageBuilder<R>>,
    dao: Arc<dyn NoneStreamDao>,
}

impl<R: NoneStream> NoneStreamAccessor<R> {
    pub fn new(builder: Box<dyn StorageBuilder<R>>, dao: Arc<dyn NoneStreamDao>) -> Self {
        Self { builder, dao }
    }

    /// Convert and insert one record
    pub async fn insert(&self, model: &Model, record: &R) -> Result<(), ContractError> {
        let row = self.builder.entity_to_storage(record)?;
        self.dao.insert(model, row).await
    }

    /// Remove rows below `deadline_bucket`
    pub async fn delete_expired(
        &self,
        model: &Model,
        deadline_bucket: i64,
    ) -> Result<usize, ContractError> {
        self.dao.delete_expired(model, deadline_bucket).await
    }
}

/// Object-safe worker capability stored in the dispatcher registry
#[async_trait]
pub trait RecordWorker: Send + Sync {
    /// Stream this worker persists
    fn stream(&self) -> &StreamName;

    /// Hand one record to the worker without blocking.
    ///
    /// Returns true if queued, false if rejected (queue full, closed, or a
    /// record of another type).
    fn intake(&self, record: Box<dyn Any + Send>) -> bool;

    /// Shared counters
    fn metrics(&self) -> &Arc<WorkerMetrics>;

    /// Stop intake, drain queued records and wait for the task
    async fn shutdown(&self);
}

/// Worker owning the write path of one record type
pub struct PersistentWorker<R: NoneStream> {
    stream: StreamName,
    tx: mpsc::Sender<R>,
    metrics: Arc<WorkerMetrics>,
    stop_tx: watch::Sender<bool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl<R: NoneStream> PersistentWorker<R> {
    /// Create the worker and spawn its task.
    ///
    /// Must be called within a Tokio runtime.
    pub fn new(ctx: &ModuleContext, model: Arc<Model>, accessor: NoneStreamAccessor<R>) -> Self {
        let config = ctx.worker_config();
        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
        let (stop_tx, stop_rx) = watch::channel(false);
        let metrics = Arc::new(WorkerMetrics::new());

        let ttl = config.ttl_check_interval().map(|interval| TtlPolicy {
            interval,
            ttl_days: config.record_ttl_days,
        });

        let stream = model.name.clone();
        let task = tokio::spawn(persist_loop(
            accessor,
            model,
            rx,
            stop_rx,
            Arc::clone(&metrics),
            ttl,
        ));

        Self {
            stream,
            tx,
            metrics,
            stop_tx,
            task: Mutex::new(Some(task)),
        }
    }

    /// Typed intake (non-blocking)
    pub fn in_record(&self, record: R) -> bool {
        match self.tx.try_send(record) {
            Ok(()) => {
                self.metrics
                    .set_queue_len(self.tx.max_capacity() - self.tx.capacity());
                true
            }
            Err(mpsc::error::TrySendError::Full(r)) => {
                self.metrics.inc_dropped_count();
                obs::record_intake_dropped(&self.stream);
                warn!(
                    stream = %self.stream,
                    id = %r.entity_id(),
                    "Queue full, record dropped"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(r)) => {
                self.metrics.inc_dropped_count();
                obs::record_intake_dropped(&self.stream);
                warn!(
                    stream = %self.stream,
                    id = %r.entity_id(),
                    "Worker stopped, record dropped"
                );
                false
            }
        }
    }
}

#[async_trait]
impl<R: NoneStream> RecordWorker for PersistentWorker<R> {
    fn stream(&self) -> &StreamName {
        &self.stream
    }

    fn intake(&self, record: Box<dyn Any + Send>) -> bool {
        match record.downcast::<R>() {
            Ok(record) => self.in_record(*record),
            Err(_) => {
                self.metrics.inc_dropped_count();
                error!(
                    stream = %self.stream,
                    kind = R::KIND,
                    "Record type does not match worker, dropped"
                );
                false
            }
        }
    }

    fn metrics(&self) -> &Arc<WorkerMetrics> {
        &self.metrics
    }

    #[instrument(name = "persistent_worker_shutdown", skip(self), fields(stream = %self.stream))]
    async fn shutdown(&self) {
        let _ = self.stop_tx.send(true);
        let task = self
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(task) = task {
            if let Err(e) = task.await {
                error!(stream = %self.stream, error = ?e, "Worker task panicked");
            }
        }
        debug!(stream = %self.stream, "PersistentWorker shutdown complete");
    }
}

#[derive(Debug, Clone, Copy)]
struct TtlPolicy {
    interval: Duration,
    ttl_days: u32,
}

/// Worker task: writes queued records, expires old rows, drains on stop
#[instrument(
    name = "persistent_worker_loop",
    skip(accessor, model, rx, stop_rx, metrics, ttl),
    fields(stream = %model.name)
)]
async fn persist_loop<R: NoneStream>(
    accessor: NoneStreamAccessor<R>,
    model: Arc<Model>,
    mut rx: mpsc::Receiver<R>,
    mut stop_rx: watch::Receiver<bool>,
    metrics: Arc<WorkerMetrics>,
    ttl: Option<TtlPolicy>,
) {
    debug!(stream = %model.name, "Persistent worker started");

    let mut keeper = ttl.map(|policy| {
        let mut interval = interval_at(Instant::now() + policy.interval, policy.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        (interval, policy.ttl_days)
    });

    loop {
        tokio::select! {
            maybe_record = rx.recv() => {
                let Some(record) = maybe_record else { break };
                metrics.set_queue_len(rx.len());
                persist(&accessor, &model, &metrics, record).await;
            }
            ttl_days = next_expiry(&mut keeper) => {
                expire(&accessor, &model, &metrics, ttl_days).await;
            }
            _ = stop_rx.changed() => {
                rx.close();
                while let Some(record) = rx.recv().await {
                    persist(&accessor, &model, &metrics, record).await;
                }
                break;
            }
        }
    }

    metrics.set_queue_len(0);
    info!(
        stream = %model.name,
        written = metrics.write_count(),
        failed = metrics.failure_count(),
        "Persistent worker stopped"
    );
}

async fn next_expiry(keeper: &mut Option<(Interval, u32)>) -> u32 {
    match keeper {
        Some((interval, ttl_days)) => {
            interval.tick().await;
            *ttl_days
        }
        None => std::future::pending().await,
    }
}

async fn persist<R: NoneStream>(
    accessor: &NoneStreamAccessor<R>,
    model: &Model,
    metrics: &WorkerMetrics,
    record: R,
) {
    match accessor.insert(model, &record).await {
        Ok(()) => {
            metrics.inc_write_count();
            obs::record_write(&model.name, true);
        }
        Err(e) => {
            // no retry; the next update of the entity overwrites it
            metrics.inc_failure_count();
            obs::record_write(&model.name, false);
            error!(
                stream = %model.name,
                id = %record.entity_id(),
                error = %e,
                "Write failed"
            );
        }
    }
}

async fn expire<R: NoneStream>(
    accessor: &NoneStreamAccessor<R>,
    model: &Model,
    metrics: &WorkerMetrics,
    ttl_days: u32,
) {
    let deadline = time_bucket::expiry_deadline(chrono::Utc::now(), ttl_days);
    if deadline <= 0 {
        debug!(stream = %model.name, ttl_days, "TTL reaches past the earliest bucket, nothing to expire");
        return;
    }
    match accessor.delete_expired(model, deadline).await {
        Ok(0) => {}
        Ok(n) => {
            metrics.add_expired_count(n as u64);
            obs::record_expired(&model.name, n as u64);
            debug!(stream = %model.name, deadline, expired = n, "Expired rows removed");
        }
        Err(e) => {
            error!(stream = %model.name, deadline, error = %e, "Expiry pass failed");
        }
    }
}
