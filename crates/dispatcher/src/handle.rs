//! SinkHandle - one sink behind its own queue and worker task

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument, warn};

use contracts::{ObservationRecord, RecordSink};

use crate::metrics::SinkMetrics;

/// Handle to a running sink worker
pub struct SinkHandle {
    name: String,
    tx: mpsc::Sender<ObservationRecord>,
    metrics: Arc<SinkMetrics>,
    worker_handle: JoinHandle<()>,
}

impl SinkHandle {
    /// Spawn the worker task for `sink`
    pub fn spawn<S: RecordSink + Send + 'static>(sink: S, queue_capacity: usize) -> Self {
        let name = sink.name().to_string();
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        let metrics = Arc::new(SinkMetrics::new());

        let worker_metrics = Arc::clone(&metrics);
        let worker_name = name.clone();

        let worker_handle = tokio::spawn(async move {
            sink_worker(sink, rx, worker_metrics, worker_name).await;
        });

        Self {
            name,
            tx,
            metrics,
            worker_handle,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn metrics(&self) -> &Arc<SinkMetrics> {
        &self.metrics
    }

    /// Queue a row without waiting.
    ///
    /// Returns false if the row was dropped.
    pub fn try_send(&self, record: ObservationRecord) -> bool {
        match self.tx.try_send(record) {
            Ok(()) => {
                self.metrics
                    .set_queue_len(self.tx.max_capacity() - self.tx.capacity());
                true
            }
            Err(mpsc::error::TrySendError::Full(r)) => {
                self.metrics.record_drop();
                warn!(
                    sink = %self.name,
                    kind = ?r.kind,
                    sim_time = r.sim_time,
                    "Queue full, record dropped"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                error!(sink = %self.name, "Sink worker closed unexpectedly");
                false
            }
        }
    }

    /// Drain the queue, then flush and close the sink.
    #[instrument(name = "sink_handle_shutdown", skip(self), fields(sink = %self.name))]
    pub async fn shutdown(self) {
        drop(self.tx);
        if let Err(e) = self.worker_handle.await {
            error!(sink = %self.name, error = ?e, "Worker task panicked");
        }
        debug!(sink = %self.name, "SinkHandle shutdown complete");
    }
}

#[instrument(
    name = "sink_worker_loop",
    skip(sink, rx, metrics),
    fields(sink = %name)
)]
async fn sink_worker<S: RecordSink>(
    mut sink: S,
    mut rx: mpsc::Receiver<ObservationRecord>,
    metrics: Arc<SinkMetrics>,
    name: String,
) {
    debug!(sink = %name, "Sink worker started");

    while let Some(record) = rx.recv().await {
        metrics.set_queue_len(rx.len());

        let result = sink.write(&record).await;
        metrics.record_write(result.is_ok());
        if let Err(e) = result {
            error!(
                sink = %name,
                kind = ?record.kind,
                error = %e,
                "Write failed"
            );
        }
    }

    if let Err(e) = sink.flush().await {
        error!(sink = %name, error = %e, "Flush failed on shutdown");
    }
    if let Err(e) = sink.close().await {
        error!(sink = %name, error = %e, "Close failed on shutdown");
    }

    debug!(sink = %name, "Sink worker stopped");
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use contracts::ContractError;
    use std::sync::atomic::{AtomicU64, Ordering};
    use tokio::time::{Duration, sleep};

    /// Counters shared between a [`MockSink`] and the test body
    #[derive(Debug, Default)]
    pub(crate) struct MockCounters {
        pub writes: AtomicU64,
        pub flushes: AtomicU64,
        pub closes: AtomicU64,
    }

    pub(crate) struct MockSink {
        pub name: String,
        pub counters: Arc<MockCounters>,
        pub should_fail: bool,
        pub delay_ms: u64,
    }

    impl MockSink {
        pub fn new(name: &str) -> (Self, Arc<MockCounters>) {
            let counters = Arc::new(MockCounters::default());
            let sink = Self {
                name: name.to_string(),
                counters: Arc::clone(&counters),
                should_fail: false,
                delay_ms: 0,
            };
            (sink, counters)
        }
    }

    impl RecordSink for MockSink {
        fn name(&self) -> &str {
            &self.name
        }

        async fn write(&mut self, _record: &ObservationRecord) -> Result<(), ContractError> {
            if self.delay_ms > 0 {
                sleep(Duration::from_millis(self.delay_ms)).await;
            }
            if self.should_fail {
                return Err(ContractError::sink_write(&self.name, "mock failure"));
            }
            self.counters.writes.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }

        async fn flush(&mut self) -> Result<(), ContractError> {
            self.counters.flushes.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }

        async fn close(&mut self) -> Result<(), ContractError> {
            self.counters.closes.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }
    }

    pub(crate) fn record(i: u32) -> ObservationRecord {
        ObservationRecord::proximity(f64::from(i) * 0.05, 10.0 + f64::from(i), -1.0)
    }

    #[tokio::test]
    async fn test_sink_handle_basic() {
        let (sink, counters) = MockSink::new("test");
        let handle = SinkHandle::spawn(sink, 10);

        for i in 0..5 {
            assert!(handle.try_send(record(i)));
        }

        handle.shutdown().await;
        assert_eq!(counters.writes.load(Ordering::Relaxed), 5);
        assert_eq!(counters.flushes.load(Ordering::Relaxed), 1);
        assert_eq!(counters.closes.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_sink_handle_queue_full() {
        let (mut sink, _counters) = MockSink::new("slow");
        sink.delay_ms = 100;

        let handle = SinkHandle::spawn(sink, 2);
        for i in 0..10 {
            handle.try_send(record(i));
        }

        assert!(handle.metrics().snapshot().dropped_count > 0);
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_sink_handle_failure_isolation() {
        let (mut sink, counters) = MockSink::new("failing");
        sink.should_fail = true;

        let handle = SinkHandle::spawn(sink, 10);
        for i in 0..3 {
            handle.try_send(record(i));
        }

        sleep(Duration::from_millis(50)).await;
        assert_eq!(handle.metrics().snapshot().failure_count, 3);

        handle.shutdown().await;
        // Still flushed and closed after failed writes
        assert_eq!(counters.closes.load(Ordering::Relaxed), 1);
    }
}
