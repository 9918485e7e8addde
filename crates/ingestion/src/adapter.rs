//! 传感器适配器
//!
//! 把 `SensorSource` 的回调接到 `PacketRouter` 上，并负责启停。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use contracts::{SensorDataCallback, SensorSource, SensorType};
use tracing::{debug, warn};

use crate::router::PacketRouter;

/// Registered sensor source plus its listening state
pub struct SourceAdapter {
    sensor_id: String,
    source: Box<dyn SensorSource>,
    listening: Arc<AtomicBool>,
}

impl SourceAdapter {
    pub fn new(sensor_id: String, source: Box<dyn SensorSource>) -> Self {
        Self {
            sensor_id,
            source,
            listening: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn sensor_id(&self) -> &str {
        &self.sensor_id
    }

    pub fn sensor_type(&self) -> SensorType {
        self.source.sensor_type()
    }

    /// Subscribe the source. Repeated calls while listening are ignored.
    pub fn start(&self, router: PacketRouter) {
        if self.listening.swap(true, Ordering::SeqCst) {
            return;
        }

        let sensor_id = self.sensor_id.clone();
        let sensor_type = self.source.sensor_type();
        let listening = self.listening.clone();

        debug!(sensor_id = %sensor_id, sensor_type = sensor_type.as_str(), "starting source adapter");

        let callback: SensorDataCallback = Arc::new(move |packet| {
            // Packets racing a stop are discarded
            if !listening.load(Ordering::Relaxed) {
                return;
            }
            if let Err(e) = router.route(sensor_type, packet) {
                warn!(sensor_id = %sensor_id, error = %e, "packet rejected");
            }
        });

        self.source.listen(callback);
    }

    /// Unsubscribe the source. Safe to call more than once.
    pub fn stop(&self) {
        if self.listening.swap(false, Ordering::SeqCst) {
            debug!(sensor_id = %self.sensor_id, "stopping source adapter");
            self.source.stop();
        }
    }

    pub fn is_listening(&self) -> bool {
        self.listening.load(Ordering::Relaxed)
    }
}
