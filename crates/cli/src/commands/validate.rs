//! `validate` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use contracts::{IngestConfig, StorageBackend};

use crate::cli::ValidateArgs;
use crate::pipeline::BUILTIN_STREAMS;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    backend: String,
    disabled_stream_count: usize,
    queue_capacity: usize,
    record_ttl_days: u32,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(config) => {
            let warnings = collect_warnings(&config);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", config.version),
                    backend: format!("{:?}", config.storage.backend),
                    disabled_stream_count: config.disabled_streams.len(),
                    queue_capacity: config.worker.queue_capacity,
                    record_ttl_days: config.worker.record_ttl_days,
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &IngestConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    for name in &config.disabled_streams {
        if !BUILTIN_STREAMS.iter().any(|entry| entry.stream == name) {
            warnings.push(format!(
                "Disabled stream '{}' does not match any built-in stream",
                name
            ));
        }
    }

    if BUILTIN_STREAMS
        .iter()
        .all(|entry| config.disabled_streams.iter().any(|name| name == entry.stream))
    {
        warnings.push("All built-in streams are disabled - every record will be ignored".to_string());
    }

    if config.worker.ttl_check_interval().is_none() {
        warnings.push("worker.ttl_check_interval_secs is 0 - expired rows are never deleted".to_string());
    }

    if config.storage.backend == StorageBackend::Log {
        warnings.push("Log backend keeps no rows - records are only logged".to_string());
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Backend: {}", summary.backend);
            println!("  Disabled streams: {}", summary.disabled_stream_count);
            println!("  Queue capacity: {}", summary.queue_capacity);
            println!("  Record TTL: {} days", summary.record_ttl_days);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
