//! Per-sink counters

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering::Relaxed};

/// Counters shared between a [`SinkHandle`](crate::SinkHandle) and its worker
#[derive(Debug, Default)]
pub struct SinkMetrics {
    queue_len: AtomicUsize,
    written: AtomicU64,
    failed: AtomicU64,
    dropped: AtomicU64,
}

impl SinkMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn set_queue_len(&self, len: usize) {
        self.queue_len.store(len, Relaxed);
    }

    pub(crate) fn record_write(&self, ok: bool) {
        let counter = if ok { &self.written } else { &self.failed };
        counter.fetch_add(1, Relaxed);
    }

    /// Row rejected because the sink queue was full
    pub(crate) fn record_drop(&self) {
        self.dropped.fetch_add(1, Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            queue_len: self.queue_len.load(Relaxed),
            write_count: self.written.load(Relaxed),
            failure_count: self.failed.load(Relaxed),
            dropped_count: self.dropped.load(Relaxed),
        }
    }
}

/// Point-in-time copy of [`SinkMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub queue_len: usize,
    pub write_count: u64,
    pub failure_count: u64,
    pub dropped_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_reflects_counters() {
        let metrics = SinkMetrics::new();
        metrics.record_write(true);
        metrics.record_write(true);
        metrics.record_write(false);
        metrics.record_drop();
        metrics.set_queue_len(3);

        assert_eq!(
            metrics.snapshot(),
            MetricsSnapshot {
                queue_len: 3,
                write_count: 2,
                failure_count: 1,
                dropped_count: 1,
            }
        );
    }
}
