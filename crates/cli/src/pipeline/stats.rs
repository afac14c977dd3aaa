//! Run statistics.

use std::time::Duration;

use contracts::StreamName;
use dispatcher::MetricsSnapshot;
use observability::IngestSummary;

/// Statistics from an ingestion run
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    /// Intake counters
    pub summary: IngestSummary,

    /// Per-worker counters after shutdown, sorted by stream
    pub workers: Vec<(StreamName, MetricsSnapshot)>,

    /// Total duration of the run
    pub duration: Duration,
}

impl RunStats {
    /// Counters summed over all workers
    pub fn totals(&self) -> MetricsSnapshot {
        self.workers
            .iter()
            .fold(MetricsSnapshot::default(), |acc, (_, m)| acc + *m)
    }

    /// Dispatched records per second
    pub fn records_per_sec(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.summary.dispatched as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                    Ingestion Statistics                      ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        let totals = self.totals();

        println!("📊 Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Lines read: {}", self.summary.lines_read);
        println!("   ├─ Parse errors: {}", self.summary.parse_errors);
        println!(
            "   ├─ Dispatched: {} ({:.2}%)",
            self.summary.dispatched,
            self.summary.routed_rate()
        );
        println!("   ├─ Unrouted: {}", self.summary.unrouted);
        println!("   └─ Records/s: {:.2}", self.records_per_sec());

        println!("\n💾 Workers ({})", self.workers.len());
        for (stream, m) in &self.workers {
            println!(
                "   ├─ {}: written={} failed={} dropped={} expired={}",
                stream, m.write_count, m.failure_count, m.dropped_count, m.expired_count
            );
        }
        println!(
            "   └─ total: written={} failed={} dropped={} expired={}",
            totals.write_count, totals.failure_count, totals.dropped_count, totals.expired_count
        );

        println!();
    }
}
