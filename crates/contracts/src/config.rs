//! IngestConfig - Config Loader output
//!
//! Disabled stream families, worker tuning and storage backend selection.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Config version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete ingestion configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Config version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Stream names whose registration is suppressed
    #[serde(default)]
    pub disabled_streams: Vec<String>,

    /// Persistent worker settings
    #[serde(default)]
    pub worker: WorkerConfig,

    /// Storage backend
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Persistent worker settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Bounded intake queue per stream
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Days a record is retained after its time bucket
    #[serde(default = "default_record_ttl_days")]
    pub record_ttl_days: u32,

    /// Seconds between expiry passes (0 = keeper disabled)
    #[serde(default = "default_ttl_check_interval_secs")]
    pub ttl_check_interval_secs: u64,
}

fn default_queue_capacity() -> usize {
    1000
}

fn default_record_ttl_days() -> u32 {
    3
}

fn default_ttl_check_interval_secs() -> u64 {
    300
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            record_ttl_days: default_record_ttl_days(),
            ttl_check_interval_secs: default_ttl_check_interval_secs(),
        }
    }
}

impl WorkerConfig {
    /// Interval between expiry passes, `None` when the keeper is disabled
    pub fn ttl_check_interval(&self) -> Option<Duration> {
        (self.ttl_check_interval_secs > 0).then(|| Duration::from_secs(self.ttl_check_interval_secs))
    }
}

/// Storage backend type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// In-process tables
    #[default]
    Memory,
    /// One JSON-lines file per model
    File,
    /// Log rows via tracing
    Log,
}

/// Storage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Base directory (file backend)
    #[serde(default)]
    pub path: Option<PathBuf>,
}
