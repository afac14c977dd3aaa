//! MemoryStorage - in-process tables keyed by model name

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use contracts::{
    ContractError, Model, NoneStreamDao, StorageDao, StorageRow, StreamDescriptor, StreamName,
};

type Table = BTreeMap<String, StorageRow>;

/// In-memory storage; rows are keyed by entity id inside each model's table.
///
/// Cloning shares the tables, so the DAOs handed to workers and the handle
/// kept by the caller see the same rows.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    tables: Arc<RwLock<HashMap<StreamName, Table>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows of a model ordered by id
    pub async fn rows(&self, model: &str) -> Vec<StorageRow> {
        self.tables
            .read()
            .await
            .get(model)
            .map(|table| table.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Row by id
    pub async fn get(&self, model: &str, id: &str) -> Option<StorageRow> {
        self.tables
            .read()
            .await
            .get(model)
            .and_then(|table| table.get(id).cloned())
    }

    /// Number of rows in a model
    pub async fn row_count(&self, model: &str) -> usize {
        self.tables
            .read()
            .await
            .get(model)
            .map_or(0, BTreeMap::len)
    }
}

impl StorageDao for MemoryStorage {
    fn name(&self) -> &str {
        "memory"
    }

    fn new_none_stream_dao(
        &self,
        stream: &StreamDescriptor,
    ) -> Result<Arc<dyn NoneStreamDao>, ContractError> {
        debug!(stream = %stream.name, "Memory none-stream DAO created");
        Ok(Arc::new(self.clone()))
    }
}

#[async_trait]
impl NoneStreamDao for MemoryStorage {
    async fn insert(&self, model: &Model, row: StorageRow) -> Result<(), ContractError> {
        let mut tables = self.tables.write().await;
        tables
            .entry(model.name.clone())
            .or_default()
            .insert(row.id.clone(), row);
        Ok(())
    }

    async fn delete_expired(
        &self,
        model: &Model,
        deadline_bucket: i64,
    ) -> Result<usize, ContractError> {
        let mut tables = self.tables.write().await;
        let Some(table) = tables.get_mut(model.name.as_str()) else {
            return Ok(0);
        };
        let before = table.len();
        table.retain(|_, row| row.time_bucket >= deadline_bucket);
        Ok(before - table.len())
    }
}
