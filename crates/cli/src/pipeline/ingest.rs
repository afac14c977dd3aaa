//! JSON-lines intake
//!
//! Each non-empty input line is an envelope `{"kind": "...", "record": {...}}`.
//! Malformed lines, invalid UTF-8 included, are counted and skipped; they
//! never stop the run.

use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use serde::Deserialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use dispatcher::NoneStreamDispatcher;
use observability::IngestSummary;

use super::catalog;
use crate::error::{CliError, Result};

#[derive(Debug, Deserialize)]
struct Envelope {
    kind: String,
    record: serde_json::Value,
}

/// Reads records and hands them to the shared dispatcher
pub struct IngestPipeline {
    dispatcher: Arc<NoneStreamDispatcher>,
    /// Updated per line, so an interrupted run still has its counters
    summary: Mutex<IngestSummary>,
}

impl IngestPipeline {
    pub fn new(dispatcher: Arc<NoneStreamDispatcher>) -> Self {
        Self {
            dispatcher,
            summary: Mutex::new(IngestSummary::new()),
        }
    }

    /// Counters accumulated so far
    pub fn summary(&self) -> IngestSummary {
        self.lock_summary().clone()
    }

    fn lock_summary(&self) -> std::sync::MutexGuard<'_, IngestSummary> {
        self.summary.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Ingest from a file path, or stdin when the path is `-`
    pub async fn run_path(&self, input: &Path) -> Result<IngestSummary> {
        if input == Path::new("-") {
            info!("Reading records from stdin");
            return self.run(BufReader::new(tokio::io::stdin())).await;
        }

        let file = tokio::fs::File::open(input)
            .await
            .map_err(|e| CliError::input_open(input.display().to_string(), e))?;
        info!(input = %input.display(), "Reading records from file");
        self.run(BufReader::new(file)).await
    }

    /// Ingest every line of `reader`
    pub async fn run<Rd>(&self, mut reader: Rd) -> Result<IngestSummary>
    where
        Rd: AsyncBufRead + Unpin,
    {
        let mut buf = Vec::new();

        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).await? == 0 {
                break;
            }

            let outcome = match std::str::from_utf8(&buf) {
                Ok(line) if line.trim().is_empty() => None,
                Ok(line) => Some(self.ingest_line(line.trim())),
                Err(e) => Some(Err(CliError::record_parse("<envelope>", e.to_string()))),
            };

            let mut summary = self.lock_summary();
            summary.lines_read += 1;
            match outcome {
                None => {}
                Some(Ok((kind, routed))) => summary.update(&kind, routed),
                Some(Err(e)) => {
                    warn!(line = summary.lines_read, error = %e, "Skipping malformed line");
                    summary.parse_errors += 1;
                }
            }
        }

        let summary = self.summary();
        debug!(
            lines = summary.lines_read,
            dispatched = summary.dispatched,
            "Input exhausted"
        );
        Ok(summary)
    }

    fn ingest_line(&self, line: &str) -> Result<(String, bool)> {
        let envelope: Envelope = serde_json::from_str(line)
            .map_err(|e| CliError::record_parse("<envelope>", e.to_string()))?;
        let routed = catalog::route(&self.dispatcher, &envelope.kind, envelope.record)?;
        Ok((envelope.kind, routed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::bootstrap;
    use contracts::IngestConfig;
    use tokio::io::AsyncWriteExt;

    const INPUT: &str = r#"
{"kind":"ui_template","record":{"template_id":"General-Service","configuration":"{}","update_time":1609459200000}}
{"kind":"profile_task","record":{"task_id":"t-1","service_id":"svc","endpoint_name":"/orders","start_time":1609459200000,"duration":5,"create_time":1609459200000}}
not json
{"kind":"alarm_rule_config","record":{"rule_name":"r1"}}
{"kind":"service_instance","record":{}}
"#;

    #[tokio::test]
    async fn test_ingest_counts_outcomes() {
        let config = IngestConfig {
            disabled_streams: vec!["profile_task".into()],
            ..Default::default()
        };
        let runtime = bootstrap(&config).unwrap();
        let dispatcher = Arc::new(runtime.dispatcher);
        let pipeline = IngestPipeline::new(Arc::clone(&dispatcher));

        let summary = pipeline.run(INPUT.as_bytes()).await.unwrap();

        // leading blank line included
        assert_eq!(summary.lines_read, 6);
        assert_eq!(summary.dispatched, 1);
        assert_eq!(summary.unrouted, 2);
        assert_eq!(summary.parse_errors, 2);
        assert_eq!(summary.per_kind.get("ui_template"), Some(&1));

        dispatcher.shutdown().await;
        let (_, snapshot) = dispatcher
            .metrics()
            .into_iter()
            .find(|(stream, _)| stream == "ui_template")
            .unwrap();
        assert_eq!(snapshot.write_count, 1);
    }

    #[tokio::test]
    async fn test_invalid_utf8_line_is_skipped() {
        let runtime = bootstrap(&IngestConfig::default()).unwrap();
        let dispatcher = Arc::new(runtime.dispatcher);
        let pipeline = IngestPipeline::new(Arc::clone(&dispatcher));

        let mut input = b"\xff\xfe garbage\n".to_vec();
        input.extend_from_slice(
            br#"{"kind":"ui_template","record":{"template_id":"APM","configuration":"{}","update_time":1609459200000}}"#,
        );
        input.push(b'\n');

        let summary = pipeline.run(input.as_slice()).await.unwrap();
        assert_eq!(summary.lines_read, 2);
        assert_eq!(summary.parse_errors, 1);
        assert_eq!(summary.dispatched, 1);
        dispatcher.shutdown().await;
    }

    #[tokio::test]
    async fn test_summary_is_readable_while_running() {
        let runtime = bootstrap(&IngestConfig::default()).unwrap();
        let dispatcher = Arc::new(runtime.dispatcher);
        let pipeline = IngestPipeline::new(Arc::clone(&dispatcher));

        // the writer stays open, so the run never reaches end of input
        let (mut writer, reader) = tokio::io::duplex(1024);
        writer
            .write_all(br#"{"kind":"ui_template","record":{"template_id":"APM","configuration":"{}","update_time":1609459200000}}"#)
            .await
            .unwrap();
        writer.write_all(b"\n").await.unwrap();

        let interrupted = tokio::time::timeout(
            std::time::Duration::from_millis(200),
            pipeline.run(BufReader::new(reader)),
        )
        .await;
        assert!(interrupted.is_err());

        let summary = pipeline.summary();
        assert_eq!(summary.lines_read, 1);
        assert_eq!(summary.dispatched, 1);
        assert_eq!(summary.per_kind.get("ui_template"), Some(&1));

        drop(writer);
        dispatcher.shutdown().await;
    }

    #[tokio::test]
    async fn test_missing_input_file() {
        let dispatcher = Arc::new(NoneStreamDispatcher::new(Default::default()));
        let pipeline = IngestPipeline::new(dispatcher);
        let dir = tempfile::tempdir().unwrap();

        let result = pipeline.run_path(&dir.path().join("absent.jsonl")).await;
        assert!(matches!(result, Err(CliError::InputOpen { .. })));
    }
}
