//! # Dispatcher
//!
//! None-stream ingestion module.
//!
//! 负责：
//! - 按记录类型注册唯一的持久化 worker
//! - 将记录路由到对应 worker，未注册类型静默丢弃
//! - 提供存储后端 (memory / file / log) 与模型注册表

pub mod dispatcher;
pub mod error;
pub mod metrics;
pub mod model;
pub mod storage;
pub mod worker;

pub use contracts::{NoneStream, StreamDefinition};
pub use dispatcher::{NoneStreamDispatcher, Registration};
pub use error::DispatcherError;
pub use metrics::{MetricsSnapshot, WorkerMetrics};
pub use model::StorageModels;
pub use storage::{create_storage, FileStorage, LogStorage, MemoryStorage};
pub use worker::{NoneStreamAccessor, PersistentWorker, RecordWorker};
