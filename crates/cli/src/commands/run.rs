//! `run` command implementation.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::pipeline::{bootstrap, IngestPipeline, RunStats};

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }

    let mut config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if let Some(capacity) = args.queue_capacity {
        if capacity == 0 {
            anyhow::bail!("--queue-capacity must be > 0");
        }
        info!(capacity, "Overriding worker queue capacity from CLI");
        config.worker.queue_capacity = capacity;
    }

    info!(
        backend = ?config.storage.backend,
        disabled = config.disabled_streams.len(),
        queue_capacity = config.worker.queue_capacity,
        record_ttl_days = config.worker.record_ttl_days,
        "Configuration loaded"
    );

    if args.metrics_port != 0 {
        observability::init_metrics_only(args.metrics_port)?;
    }

    let start_time = Instant::now();
    let runtime = bootstrap(&config).context("Failed to register streams")?;
    for (kind, outcome) in &runtime.registrations {
        debug!(kind, outcome = outcome.as_str(), "Built-in kind registered");
    }
    let dispatcher = Arc::new(runtime.dispatcher);
    info!(
        bound = dispatcher.bound_streams().len(),
        "Streams registered, starting intake"
    );

    let pipeline = IngestPipeline::new(Arc::clone(&dispatcher));
    let shutdown_signal = setup_shutdown_signal();

    let outcome = tokio::select! {
        result = pipeline.run_path(&args.input) => Some(result),
        _ = shutdown_signal => {
            warn!("Received shutdown signal, stopping intake...");
            None
        }
    };

    // Drain queued records whatever stopped the intake
    dispatcher.shutdown().await;

    // interrupted runs report what was ingested before the signal
    let summary = match outcome {
        Some(result) => result.context("Ingestion failed")?,
        None => pipeline.summary(),
    };

    let stats = RunStats {
        summary,
        workers: dispatcher.metrics(),
        duration: start_time.elapsed(),
    };

    let totals = stats.totals();
    info!(
        dispatched = stats.summary.dispatched,
        unrouted = stats.summary.unrouted,
        routed_rate = stats.summary.routed_rate(),
        written = totals.write_count,
        failed = totals.failure_count,
        duration_secs = stats.duration.as_secs_f64(),
        "Ingestion finished"
    );
    stats.print_summary();

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM
async fn setup_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
