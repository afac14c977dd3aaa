//! Ingestion pipeline: bootstrap, built-in catalog, JSON-lines intake.

mod bootstrap;
mod catalog;
mod ingest;
mod stats;

pub use bootstrap::{bootstrap, Runtime};
pub use catalog::BUILTIN_STREAMS;
pub use ingest::IngestPipeline;
pub use stats::RunStats;
