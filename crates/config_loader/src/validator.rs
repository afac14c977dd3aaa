//! 配置校验模块
//!
//! 校验规则：
//! - disabled_streams 非空且唯一
//! - queue_capacity > 0
//! - 0 < record_ttl_days <= MAX_RECORD_TTL_DAYS
//! - file 后端必须配置 path

use std::collections::HashSet;

use contracts::{ContractError, IngestConfig, StorageBackend};

/// record_ttl_days 上限（约 100 年）
const MAX_RECORD_TTL_DAYS: u32 = 36_500;

/// 校验 IngestConfig 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(config: &IngestConfig) -> Result<(), ContractError> {
    validate_disabled_streams(config)?;
    validate_worker(config)?;
    validate_storage(config)?;
    Ok(())
}

fn validate_disabled_streams(config: &IngestConfig) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, name) in config.disabled_streams.iter().enumerate() {
        if name.trim().is_empty() {
            return Err(ContractError::config_validation(
                format!("disabled_streams[{idx}]"),
                "stream name cannot be empty",
            ));
        }
        if !seen.insert(name.as_str()) {
            return Err(ContractError::config_validation(
                format!("disabled_streams[{idx}]"),
                format!("duplicate stream name '{name}'"),
            ));
        }
    }
    Ok(())
}

fn validate_worker(config: &IngestConfig) -> Result<(), ContractError> {
    let worker = &config.worker;

    if worker.queue_capacity == 0 {
        return Err(ContractError::config_validation(
            "worker.queue_capacity",
            "queue_capacity must be > 0",
        ));
    }

    if worker.record_ttl_days == 0 {
        return Err(ContractError::config_validation(
            "worker.record_ttl_days",
            "record_ttl_days must be > 0",
        ));
    }

    if worker.record_ttl_days > MAX_RECORD_TTL_DAYS {
        return Err(ContractError::config_validation(
            "worker.record_ttl_days",
            format!("record_ttl_days must be <= {MAX_RECORD_TTL_DAYS}"),
        ));
    }

    Ok(())
}

fn validate_storage(config: &IngestConfig) -> Result<(), ContractError> {
    let storage = &config.storage;
    if storage.backend == StorageBackend::File && storage.path.is_none() {
        return Err(ContractError::config_validation(
            "storage.path",
            "file backend requires a path",
        ));
    }
    Ok(())
}
