//! `info` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use contracts::IngestConfig;

use crate::cli::InfoArgs;
use crate::error::CliError;
use crate::pipeline::BUILTIN_STREAMS;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    streams: Vec<StreamInfo>,
    worker: WorkerInfo,
    storage: StorageInfo,
}

#[derive(Serialize)]
struct StreamInfo {
    stream: String,
    kind: String,
    scope_id: u32,
    enabled: bool,
}

#[derive(Serialize)]
struct WorkerInfo {
    queue_capacity: usize,
    record_ttl_days: u32,
    ttl_check_interval_secs: u64,
}

#[derive(Serialize)]
struct StorageInfo {
    backend: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }

    let config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    let info = build_config_info(&config);
    if args.json {
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&info);
    }

    Ok(())
}

fn build_config_info(config: &IngestConfig) -> ConfigInfo {
    let streams = BUILTIN_STREAMS
        .iter()
        .map(|entry| StreamInfo {
            stream: entry.stream.to_string(),
            kind: entry.kind.to_string(),
            scope_id: entry.scope_id.0,
            enabled: !config
                .disabled_streams
                .iter()
                .any(|name| name == entry.stream),
        })
        .collect();

    ConfigInfo {
        version: format!("{:?}", config.version),
        streams,
        worker: WorkerInfo {
            queue_capacity: config.worker.queue_capacity,
            record_ttl_days: config.worker.record_ttl_days,
            ttl_check_interval_secs: config.worker.ttl_check_interval_secs,
        },
        storage: StorageInfo {
            backend: format!("{:?}", config.storage.backend),
            path: config
                .storage
                .path
                .as_ref()
                .map(|p| p.display().to_string()),
        },
    }
}

fn print_config_info(info: &ConfigInfo) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║               None-Stream Configuration                      ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("📦 Streams ({})", info.streams.len());
    for (i, stream) in info.streams.iter().enumerate() {
        let prefix = if i == info.streams.len() - 1 {
            "└─"
        } else {
            "├─"
        };
        let state = if stream.enabled { "enabled" } else { "disabled" };
        println!(
            "   {} {} (kind={}, scope={}) [{}]",
            prefix, stream.stream, stream.kind, stream.scope_id, state
        );
    }

    println!("\n⚙️  Worker");
    println!("   ├─ Queue capacity: {}", info.worker.queue_capacity);
    println!("   ├─ Record TTL: {} days", info.worker.record_ttl_days);
    if info.worker.ttl_check_interval_secs == 0 {
        println!("   └─ TTL check: disabled");
    } else {
        println!("   └─ TTL check: every {}s", info.worker.ttl_check_interval_secs);
    }

    println!("\n💾 Storage");
    match &info.storage.path {
        Some(path) => {
            println!("   ├─ Backend: {}", info.storage.backend);
            println!("   └─ Path: {}", path);
        }
        None => println!("   └─ Backend: {}", info.storage.backend),
    }

    println!();
}
