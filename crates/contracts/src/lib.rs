//! # Contracts
//!
//! Frozen interface contracts for none-stream ingestion: record traits,
//! stream descriptors, schema models, storage access and the module context.
//! All business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Records carry a second-granularity time bucket (`yyyyMMddHHmmss`)
//! - Expiry compares buckets, never wall-clock instants

mod config;
mod disable;
mod error;
mod model;
mod module;
pub mod records;
mod storage;
mod stream;
mod stream_name;
pub mod time_bucket;

pub use config::*;
pub use disable::DisableRegistry;
pub use error::*;
pub use model::{Model, ModelRegistry, StorageDescriptor};
pub use module::{ModuleContext, ModuleContextBuilder, ServiceRole};
pub use storage::*;
pub use stream::*;
pub use stream_name::StreamName;
