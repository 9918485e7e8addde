//! Dispatcher - fan-out of observation rows to sinks

use std::collections::HashSet;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use contracts::{ObservationRecord, SinkConfig, SinkType};

use crate::error::DispatcherError;
use crate::handle::SinkHandle;
use crate::metrics::MetricsSnapshot;
use crate::sinks::{CsvSink, LogSink};

/// Dispatcher configuration
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    pub sinks: Vec<SinkConfig>,
}

/// Builder for creating a Dispatcher
pub struct DispatcherBuilder {
    config: DispatcherConfig,
    input_rx: mpsc::Receiver<ObservationRecord>,
}

impl DispatcherBuilder {
    pub fn new(config: DispatcherConfig, input_rx: mpsc::Receiver<ObservationRecord>) -> Self {
        Self { config, input_rx }
    }

    /// Create every sink; the first failure aborts the build.
    #[instrument(name = "dispatcher_builder_build", skip(self))]
    pub async fn build(self) -> Result<Dispatcher, DispatcherError> {
        let handles = Self::initialize_handles(&self.config).await?;

        Ok(Dispatcher {
            handles,
            input_rx: self.input_rx,
        })
    }

    #[instrument(
        name = "dispatcher_initialize_handles",
        skip(config),
        fields(sink_count = config.sinks.len())
    )]
    async fn initialize_handles(
        config: &DispatcherConfig,
    ) -> Result<Vec<SinkHandle>, DispatcherError> {
        let mut names = HashSet::new();
        if let Some(dup) = config.sinks.iter().find(|s| !names.insert(s.name.as_str())) {
            return Err(DispatcherError::DuplicateSink(dup.name.clone()));
        }

        let mut handles = Vec::with_capacity(config.sinks.len());
        for sink_config in &config.sinks {
            match create_sink_handle(sink_config) {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    // Sinks created so far still get flushed and closed
                    for handle in handles {
                        handle.shutdown().await;
                    }
                    return Err(e);
                }
            }
        }
        Ok(handles)
    }
}

#[instrument(
    name = "dispatcher_create_sink_handle",
    skip(config),
    fields(sink = %config.name, sink_type = ?config.sink_type)
)]
fn create_sink_handle(config: &SinkConfig) -> Result<SinkHandle, DispatcherError> {
    match config.sink_type {
        SinkType::Log => {
            let sink = LogSink::new(&config.name);
            Ok(SinkHandle::spawn(sink, config.queue_capacity))
        }
        SinkType::Csv => {
            let sink = CsvSink::from_params(&config.name, &config.params)
                .map_err(|e| DispatcherError::sink_creation(&config.name, e))?;
            Ok(SinkHandle::spawn(sink, config.queue_capacity))
        }
    }
}

/// Reads rows from the input channel and copies each one to every sink
pub struct Dispatcher {
    handles: Vec<SinkHandle>,
    input_rx: mpsc::Receiver<ObservationRecord>,
}

impl Dispatcher {
    /// Create a dispatcher with custom sink handles (for testing)
    pub fn with_handles(
        handles: Vec<SinkHandle>,
        input_rx: mpsc::Receiver<ObservationRecord>,
    ) -> Self {
        Self { handles, input_rx }
    }

    pub fn metrics(&self) -> Vec<(String, MetricsSnapshot)> {
        self.handles
            .iter()
            .map(|h| (h.name().to_string(), h.metrics().snapshot()))
            .collect()
    }

    /// Run until the input channel closes, then shut every sink down.
    #[instrument(name = "dispatcher_run", skip(self))]
    pub async fn run(mut self) {
        info!(sinks = self.handles.len(), "Dispatcher started");

        let mut record_count: u64 = 0;

        while let Some(record) = self.input_rx.recv().await {
            record_count += 1;
            self.dispatch_record(&record);

            if record_count.is_multiple_of(500) {
                debug!(records = record_count, "Dispatcher progress");
            }
        }

        info!(
            records = record_count,
            "Dispatcher input closed, shutting down"
        );

        for (name, snapshot) in self.metrics() {
            info!(
                sink = %name,
                written = snapshot.write_count,
                failed = snapshot.failure_count,
                dropped = snapshot.dropped_count,
                "Sink summary"
            );
        }

        Self::shutdown_handles(self.handles).await;

        info!("Dispatcher shutdown complete");
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    fn dispatch_record(&self, record: &ObservationRecord) {
        for handle in &self.handles {
            handle.try_send(record.clone());
        }
    }

    async fn shutdown_handles(handles: Vec<SinkHandle>) {
        for handle in handles {
            handle.shutdown().await;
        }
    }
}

/// Convenience function to create a dispatcher from sink configs
#[instrument(name = "dispatcher_create", skip(sink_configs, input_rx))]
pub async fn create_dispatcher(
    sink_configs: Vec<SinkConfig>,
    input_rx: mpsc::Receiver<ObservationRecord>,
) -> Result<Dispatcher, DispatcherError> {
    let config = DispatcherConfig {
        sinks: sink_configs,
    };
    DispatcherBuilder::new(config, input_rx).build().await
}

/// Producer side of a running dispatcher.
///
/// Closing drains every sink queue and flushes/closes each sink; it only
/// happens once however many times [`close`](Self::close) is called.
pub struct DispatcherHandle {
    tx: Option<mpsc::Sender<ObservationRecord>>,
    task: Option<JoinHandle<()>>,
    dropped: u64,
}

impl DispatcherHandle {
    /// Hand a row to the dispatcher without waiting.
    ///
    /// Returns false if the row was dropped (input queue full or closed).
    pub fn send(&mut self, record: ObservationRecord) -> bool {
        let Some(tx) = &self.tx else {
            return false;
        };
        match tx.try_send(record) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(r)) => {
                self.dropped += 1;
                ::metrics::counter!("adas_records_dropped_total").increment(1);
                warn!(kind = ?r.kind, sim_time = r.sim_time, "Dispatcher input full, record dropped");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                error!("Dispatcher task ended unexpectedly");
                false
            }
        }
    }

    /// Rows dropped at the dispatcher input
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_none()
    }

    /// Close the input and wait for every sink to flush and close.
    ///
    /// Returns true only for the call that actually closed it.
    #[instrument(name = "dispatcher_close", skip(self))]
    pub async fn close(&mut self) -> bool {
        let Some(tx) = self.tx.take() else {
            return false;
        };
        drop(tx);
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                error!(error = ?e, "Dispatcher task panicked");
            }
        }
        info!(dropped = self.dropped, "Dispatcher closed");
        true
    }
}

/// Build the configured sinks and spawn the dispatcher task.
#[instrument(name = "dispatcher_start", skip(sink_configs), fields(sinks = sink_configs.len()))]
pub async fn start_dispatcher(
    sink_configs: Vec<SinkConfig>,
    input_capacity: usize,
) -> Result<DispatcherHandle, DispatcherError> {
    let (tx, rx) = mpsc::channel(input_capacity.max(1));
    let dispatcher = create_dispatcher(sink_configs, rx).await?;
    Ok(DispatcherHandle {
        tx: Some(tx),
        task: Some(dispatcher.spawn()),
        dropped: 0,
    })
}
