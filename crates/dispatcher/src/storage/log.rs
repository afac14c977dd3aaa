//! LogStorage - logs rows via tracing

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, instrument};

use contracts::{ContractError, Model, NoneStreamDao, StorageDao, StorageRow, StreamDescriptor};

/// Storage that only logs row summaries, for dry runs and debugging
#[derive(Clone)]
pub struct LogStorage {
    name: String,
}

impl LogStorage {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl StorageDao for LogStorage {
    fn name(&self) -> &str {
        &self.name
    }

    fn new_none_stream_dao(
        &self,
        _stream: &StreamDescriptor,
    ) -> Result<Arc<dyn NoneStreamDao>, ContractError> {
        Ok(Arc::new(self.clone()))
    }
}

#[async_trait]
impl NoneStreamDao for LogStorage {
    #[instrument(name = "log_storage_insert", skip(self, model, row), fields(storage = %self.name))]
    async fn insert(&self, model: &Model, row: StorageRow) -> Result<(), ContractError> {
        info!(
            stream = %model.name,
            scope = %model.scope_id,
            id = %row.id,
            time_bucket = row.time_bucket,
            fields = row.data.len(),
            "Row received"
        );
        Ok(())
    }

    async fn delete_expired(
        &self,
        _model: &Model,
        _deadline_bucket: i64,
    ) -> Result<usize, ContractError> {
        // Nothing retained
        Ok(0)
    }
}
