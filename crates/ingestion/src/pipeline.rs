//! Ingestion Pipeline main entry

use std::collections::BTreeMap;
use std::sync::Arc;

use contracts::{LaneEvent, SensorSource, SensorType};
use tracing::{debug, info, instrument};

use crate::adapter::SourceAdapter;
use crate::error::{IngestionError, Result};
use crate::frame_buffer::FrameBuffers;
use crate::lane_latch::LaneEventLatch;
use crate::metrics::IngestionMetrics;
use crate::router::PacketRouter;

/// Ingestion Pipeline
///
/// Owns the sensor subscriptions and the shared buffers they write into.
pub struct IngestionPipeline {
    /// Registered adapters, ordered by sensor ID
    adapters: BTreeMap<String, SourceAdapter>,

    frames: Arc<FrameBuffers>,

    lane_events: Arc<LaneEventLatch>,

    /// Shared metrics
    metrics: Arc<IngestionMetrics>,
}

impl IngestionPipeline {
    /// Create new Ingestion Pipeline
    pub fn new() -> Self {
        Self {
            adapters: BTreeMap::new(),
            frames: Arc::new(FrameBuffers::new()),
            lane_events: Arc::new(LaneEventLatch::new()),
            metrics: Arc::new(IngestionMetrics::new()),
        }
    }

    /// Register sensor data source
    ///
    /// # Arguments
    /// * `sensor_id` - Sensor configuration ID
    /// * `source` - Data source implementing `SensorSource` trait
    #[instrument(
        name = "ingestion_register_sensor_source",
        skip(self, source),
        fields(sensor_id = %sensor_id, sensor_type = source.sensor_type().as_str())
    )]
    pub fn register_sensor_source(
        &mut self,
        sensor_id: String,
        source: Box<dyn SensorSource>,
    ) -> Result<()> {
        if self.adapters.contains_key(&sensor_id) {
            return Err(IngestionError::DuplicateSensor { sensor_id });
        }
        debug!("registered sensor source");
        self.adapters
            .insert(sensor_id.clone(), SourceAdapter::new(sensor_id, source));
        Ok(())
    }

    /// Start all registered sensors
    #[instrument(name = "ingestion_start_all", skip(self))]
    pub fn start_all(&self) {
        info!(count = self.adapters.len(), "starting all sensor sources");
        let router = self.router();
        for adapter in self.adapters.values() {
            adapter.start(router.clone());
        }
    }

    /// Stop all sensors
    ///
    /// Every source is stopped, already-stopped ones are skipped.
    #[instrument(name = "ingestion_stop_all", skip(self))]
    pub fn stop_all(&self) {
        let listening = self.listening_count();
        if listening == 0 {
            return;
        }
        info!(count = listening, "stopping all sensor sources");
        for adapter in self.adapters.values() {
            adapter.stop();
        }
    }

    fn router(&self) -> PacketRouter {
        PacketRouter::new(
            self.frames.clone(),
            self.lane_events.clone(),
            self.metrics.clone(),
        )
    }

    /// Latest-frame buffers, read by the alert engine
    pub fn frames(&self) -> Arc<FrameBuffers> {
        self.frames.clone()
    }

    /// Lane events received since the previous call
    pub fn drain_lane_events(&self) -> Vec<LaneEvent> {
        self.lane_events.drain()
    }

    /// Get metrics reference
    pub fn metrics(&self) -> Arc<IngestionMetrics> {
        self.metrics.clone()
    }

    /// Get registered sensor count
    pub fn sensor_count(&self) -> usize {
        self.adapters.len()
    }

    pub fn listening_count(&self) -> usize {
        self.adapters.values().filter(|a| a.is_listening()).count()
    }

    /// Registered sensors of `sensor_type`
    pub fn sensors_of(&self, sensor_type: SensorType) -> Vec<&str> {
        self.adapters
            .values()
            .filter(|a| a.sensor_type() == sensor_type)
            .map(|a| a.sensor_id())
            .collect()
    }

    /// Check if specified sensor is listening
    pub fn is_sensor_listening(&self, sensor_id: &str) -> bool {
        self.adapters
            .get(sensor_id)
            .map(|a| a.is_listening())
            .unwrap_or(false)
    }
}

impl Default for IngestionPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for IngestionPipeline {
    fn drop(&mut self) {
        self.stop_all();
    }
}
