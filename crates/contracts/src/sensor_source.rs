//! SensorSource trait - Sensor data source abstraction
//!
//! Decouples the ingestion buffers from concrete sensor implementations, so
//! simulator-backed and mock sensors are handled the same way.

use std::sync::Arc;

use crate::{SensorPacket, SensorType};

/// Sensor data callback type
///
/// Invoked on the sensor's own thread for every packet it produces.
pub type SensorDataCallback = Arc<dyn Fn(SensorPacket) + Send + Sync>;

/// Sensor data source trait
///
/// # Example
///
/// ```ignore
/// let sensor: Box<dyn SensorSource> = client.sensor_source(actor_id, kind)?;
/// sensor.listen(Arc::new(|packet| {
///     println!("Received packet: {:?}", packet.sensor_id);
/// }));
/// // ... drive the simulation ...
/// sensor.stop();
/// ```
pub trait SensorSource: Send + Sync {
    /// Get sensor ID
    fn sensor_id(&self) -> &str;

    /// Get sensor type
    fn sensor_type(&self) -> SensorType;

    /// Register data callback
    ///
    /// Repeated calls while already listening are ignored.
    fn listen(&self, callback: SensorDataCallback);

    /// Stop listening
    ///
    /// Must be safe to call more than once.
    fn stop(&self);

    /// Check if currently listening
    fn is_listening(&self) -> bool;
}
