//! Mock sensor implementation
//!
//! Implements `SensorSource` for the mock world: cameras publish frames at a
//! fixed rate from a background thread, the lane invasion sensor forwards
//! boundary-crossing events produced by world ticks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use bytes::Bytes;
use contracts::{
    CameraPosition, ImageFrame, LaneEvent, PixelFormat, SensorDataCallback, SensorPacket,
    SensorPayload, SensorSource, SensorType,
};
use tracing::{debug, trace, warn};

use crate::world::WorldHandle;

/// Mock camera configuration
#[derive(Debug, Clone)]
pub struct MockCameraConfig {
    /// Send frequency (Hz)
    pub frequency_hz: f64,
    pub image_width: u32,
    pub image_height: u32,
}

impl Default for MockCameraConfig {
    fn default() -> Self {
        Self {
            frequency_hz: 20.0,
            image_width: 320,
            image_height: 240,
        }
    }
}

/// Mock camera
///
/// Generates BGRA frames stamped with the current world time.
pub struct MockCamera {
    sensor_id: String,
    position: CameraPosition,
    config: MockCameraConfig,
    world: WorldHandle,
    listening: Arc<AtomicBool>,
}

impl MockCamera {
    pub fn new(
        sensor_id: String,
        position: CameraPosition,
        config: MockCameraConfig,
        world: WorldHandle,
    ) -> Self {
        Self {
            sensor_id,
            position,
            config,
            world,
            listening: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl SensorSource for MockCamera {
    fn sensor_id(&self) -> &str {
        &self.sensor_id
    }

    fn sensor_type(&self) -> SensorType {
        SensorType::Camera(self.position)
    }

    fn listen(&self, callback: SensorDataCallback) {
        // Idempotent: if already listening, don't start again
        if self.listening.swap(true, Ordering::SeqCst) {
            return;
        }

        let sensor_id = self.sensor_id.clone();
        let position = self.position;
        let config = self.config.clone();
        let world = self.world.clone();
        let listening = self.listening.clone();

        let interval = Duration::from_secs_f64(1.0 / config.frequency_hz.max(1.0));
        let size = config.image_width as usize
            * config.image_height as usize
            * PixelFormat::Bgra8.bytes_per_pixel();
        let pixels = Bytes::from(vec![96u8; size]);

        thread::spawn(move || {
            let mut frame_id: u64 = 0;

            debug!(
                sensor_id = %sensor_id,
                camera = %position,
                frequency_hz = config.frequency_hz,
                "mock camera started"
            );

            while listening.load(Ordering::Relaxed) {
                frame_id += 1;
                let timestamp = world.time();

                let frame = ImageFrame {
                    camera: position,
                    width: config.image_width,
                    height: config.image_height,
                    format: PixelFormat::Bgra8,
                    timestamp,
                    frame_id: Some(frame_id),
                    data: pixels.clone(),
                };

                callback(SensorPacket {
                    sensor_id: sensor_id.clone(),
                    sensor_type: SensorType::Camera(position),
                    timestamp,
                    frame_id: Some(frame_id),
                    payload: SensorPayload::Image(frame),
                });

                trace!(sensor_id = %sensor_id, frame_id, timestamp, "mock frame sent");

                thread::sleep(interval);
            }

            debug!(sensor_id = %sensor_id, "mock camera stopped");
        });
    }

    fn stop(&self) {
        self.listening.store(false, Ordering::SeqCst);
    }

    fn is_listening(&self) -> bool {
        self.listening.load(Ordering::Relaxed)
    }
}

/// Lane invasion sensor
///
/// Receives events from the world step and invokes the callback on its own thread.
pub struct MockLaneSensor {
    sensor_id: String,
    events: Arc<Mutex<Option<Receiver<LaneEvent>>>>,
    listening: Arc<AtomicBool>,
}

const LANE_POLL_INTERVAL: Duration = Duration::from_millis(10);

impl MockLaneSensor {
    pub fn new(sensor_id: String, events: Receiver<LaneEvent>) -> Self {
        Self {
            sensor_id,
            events: Arc::new(Mutex::new(Some(events))),
            listening: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl SensorSource for MockLaneSensor {
    fn sensor_id(&self) -> &str {
        &self.sensor_id
    }

    fn sensor_type(&self) -> SensorType {
        SensorType::LaneInvasion
    }

    fn listen(&self, callback: SensorDataCallback) {
        if self.listening.swap(true, Ordering::SeqCst) {
            return;
        }

        let receiver = self
            .events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(receiver) = receiver else {
            warn!(sensor_id = %self.sensor_id, "lane sensor event stream unavailable");
            self.listening.store(false, Ordering::SeqCst);
            return;
        };

        let sensor_id = self.sensor_id.clone();
        let slot = self.events.clone();
        let listening = self.listening.clone();

        thread::spawn(move || {
            debug!(sensor_id = %sensor_id, "lane sensor started");

            while listening.load(Ordering::Relaxed) {
                match receiver.recv_timeout(LANE_POLL_INTERVAL) {
                    Ok(event) => {
                        callback(SensorPacket {
                            sensor_id: sensor_id.clone(),
                            sensor_type: SensorType::LaneInvasion,
                            timestamp: event.timestamp,
                            frame_id: Some(event.frame_id),
                            payload: SensorPayload::LaneInvasion(event),
                        });
                    }
                    Err(RecvTimeoutError::Timeout) => continue,
                    Err(RecvTimeoutError::Disconnected) => {
                        listening.store(false, Ordering::SeqCst);
                        break;
                    }
                }
            }

            // Hand the stream back so a later listen() can resume.
            *slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(receiver);
            debug!(sensor_id = %sensor_id, "lane sensor stopped");
        });
    }

    fn stop(&self) {
        self.listening.store(false, Ordering::SeqCst);
    }

    fn is_listening(&self) -> bool {
        self.listening.load(Ordering::Relaxed)
    }
}
