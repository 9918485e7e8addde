//! LogSink - observation rows via tracing

use contracts::{ContractError, ObservationRecord, RecordKind, RecordSink};
use tracing::{debug, info, instrument};

/// Sink that logs each row for debugging
pub struct LogSink {
    name: String,
}

impl LogSink {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    fn log_record(&self, record: &ObservationRecord) {
        match record.kind {
            RecordKind::Detection => info!(
                sink = %self.name,
                sim_time = record.sim_time,
                label = record.label.as_deref().unwrap_or_default(),
                confidence = record.confidence.unwrap_or_default(),
                side = record.side.map(|s| s.as_str()).unwrap_or_default(),
                level = record.level.map(|l| l.as_str()).unwrap_or_default(),
                "Detection"
            ),
            RecordKind::Proximity => debug!(
                sink = %self.name,
                sim_time = record.sim_time,
                distance_m = record.distance_m.unwrap_or_default(),
                rel_speed_mps = record.rel_speed_mps.unwrap_or_default(),
                "Nearest vehicle"
            ),
            RecordKind::Lane => info!(
                sink = %self.name,
                sim_time = record.sim_time,
                "Lane departure"
            ),
        }
    }
}

impl RecordSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn write(&mut self, record: &ObservationRecord) -> Result<(), ContractError> {
        self.log_record(record);
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    #[instrument(name = "log_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        info!(sink = %self.name, "LogSink closed");
        Ok(())
    }
}
