//! Storage access contracts
//!
//! - [`StorageBuilder`]: converts a record to and from its storage row
//! - [`StorageDao`]: storage module service creating per-stream DAOs
//! - [`NoneStreamDao`]: writes and expires rows of one model

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use std::sync::Arc;

use crate::{ContractError, Model, NoneStream, StreamDescriptor};

/// Storage form of a record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageRow {
    /// Entity id; inserting an existing id replaces the row
    pub id: String,
    /// Second-granularity bucket used for expiry
    pub time_bucket: i64,
    /// Record fields
    pub data: serde_json::Map<String, serde_json::Value>,
}

/// Converts records of type `R` to storage rows and back
pub trait StorageBuilder<R>: Send + Sync {
    fn entity_to_storage(&self, record: &R) -> Result<StorageRow, ContractError>;

    fn storage_to_entity(&self, row: &StorageRow) -> Result<R, ContractError>;
}

/// Serde-backed builder: record fields become the row's JSON object
pub struct JsonStorageBuilder<R> {
    _marker: PhantomData<fn() -> R>,
}

impl<R> JsonStorageBuilder<R>
where
    R: NoneStream + Serialize + DeserializeOwned,
{
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }

    /// [`BuilderFactory`](crate::BuilderFactory) for this builder
    pub fn factory() -> Result<Box<dyn StorageBuilder<R>>, ContractError> {
        Ok(Box::new(Self::new()))
    }
}

impl<R> Default for JsonStorageBuilder<R>
where
    R: NoneStream + Serialize + DeserializeOwned,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<R> StorageBuilder<R> for JsonStorageBuilder<R>
where
    R: NoneStream + Serialize + DeserializeOwned,
{
    fn entity_to_storage(&self, record: &R) -> Result<StorageRow, ContractError> {
        let value = serde_json::to_value(record)
            .map_err(|e| ContractError::record_conversion(R::KIND, e.to_string()))?;
        let serde_json::Value::Object(data) = value else {
            return Err(ContractError::record_conversion(
                R::KIND,
                "record must serialize to a JSON object",
            ));
        };

        Ok(StorageRow {
            id: record.entity_id(),
            time_bucket: record.time_bucket(),
            data,
        })
    }

    fn storage_to_entity(&self, row: &StorageRow) -> Result<R, ContractError> {
        serde_json::from_value(serde_json::Value::Object(row.data.clone()))
            .map_err(|e| ContractError::record_conversion(R::KIND, e.to_string()))
    }
}

/// DAO writing the rows of one none-stream model
#[async_trait]
pub trait NoneStreamDao: Send + Sync {
    /// Insert a row; an existing row with the same id is replaced
    async fn insert(&self, model: &Model, row: StorageRow) -> Result<(), ContractError>;

    /// Delete rows whose bucket is below `deadline_bucket`, returning how many went away
    async fn delete_expired(&self, model: &Model, deadline_bucket: i64)
        -> Result<usize, ContractError>;
}

/// Storage module service
pub trait StorageDao: Send + Sync {
    /// Backend name (used for logging)
    fn name(&self) -> &str;

    /// Create the DAO for a none-stream
    fn new_none_stream_dao(
        &self,
        stream: &StreamDescriptor,
    ) -> Result<Arc<dyn NoneStreamDao>, ContractError>;
}
