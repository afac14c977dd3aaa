//! Per-stream worker counters

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Counters shared between a worker handle and its task
#[derive(Debug, Default)]
pub struct WorkerMetrics {
    /// Records waiting in the intake queue
    queue_len: AtomicUsize,
    /// Rows written
    write_count: AtomicU64,
    /// Conversion or write failures
    failure_count: AtomicU64,
    /// Records rejected at intake (queue full or closed)
    dropped_count: AtomicU64,
    /// Rows removed by the TTL keeper
    expired_count: AtomicU64,
}

impl WorkerMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_len(&self) -> usize {
        self.queue_len.load(Ordering::Relaxed)
    }

    pub fn set_queue_len(&self, len: usize) {
        self.queue_len.store(len, Ordering::Relaxed);
    }

    pub fn write_count(&self) -> u64 {
        self.write_count.load(Ordering::Relaxed)
    }

    pub fn inc_write_count(&self) {
        self.write_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    pub fn inc_failure_count(&self) {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dropped_count(&self) -> u64 {
        self.dropped_count.load(Ordering::Relaxed)
    }

    pub fn inc_dropped_count(&self) {
        self.dropped_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn expired_count(&self) -> u64 {
        self.expired_count.load(Ordering::Relaxed)
    }

    pub fn add_expired_count(&self, n: u64) {
        self.expired_count.fetch_add(n, Ordering::Relaxed);
    }

    /// Point-in-time copy of all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            queue_len: self.queue_len(),
            write_count: self.write_count(),
            failure_count: self.failure_count(),
            dropped_count: self.dropped_count(),
            expired_count: self.expired_count(),
        }
    }
}

/// Snapshot of worker metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub queue_len: usize,
    pub write_count: u64,
    pub failure_count: u64,
    pub dropped_count: u64,
    pub expired_count: u64,
}

impl std::ops::Add for MetricsSnapshot {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            queue_len: self.queue_len + rhs.queue_len,
            write_count: self.write_count + rhs.write_count,
            failure_count: self.failure_count + rhs.failure_count,
            dropped_count: self.dropped_count + rhs.dropped_count,
            expired_count: self.expired_count + rhs.expired_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_sum() {
        let a = WorkerMetrics::new();
        a.inc_write_count();
        a.inc_write_count();
        a.add_expired_count(3);

        let b = WorkerMetrics::new();
        b.inc_dropped_count();

        let total = a.snapshot() + b.snapshot();
        assert_eq!(total.write_count, 2);
        assert_eq!(total.dropped_count, 1);
        assert_eq!(total.expired_count, 3);
    }
}
