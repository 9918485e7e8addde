//! Packet routing
//!
//! Moves each `SensorPacket` into the frame slot or lane latch it belongs to.

use std::sync::Arc;

use contracts::{SensorPacket, SensorPayload, SensorType};
use tracing::trace;

use crate::error::{IngestionError, Result};
use crate::frame_buffer::FrameBuffers;
use crate::lane_latch::LaneEventLatch;
use crate::metrics::IngestionMetrics;

/// Shared destination of every registered source's callback
#[derive(Debug, Clone)]
pub struct PacketRouter {
    frames: Arc<FrameBuffers>,
    lane_events: Arc<LaneEventLatch>,
    metrics: Arc<IngestionMetrics>,
}

impl PacketRouter {
    pub fn new(
        frames: Arc<FrameBuffers>,
        lane_events: Arc<LaneEventLatch>,
        metrics: Arc<IngestionMetrics>,
    ) -> Self {
        Self {
            frames,
            lane_events,
            metrics,
        }
    }

    /// Route one packet from a source registered as `expected`.
    ///
    /// Rejected packets are counted, the caller decides how loudly to log.
    pub fn route(&self, expected: SensorType, packet: SensorPacket) -> Result<()> {
        match (expected, packet.payload) {
            (SensorType::Camera(position), SensorPayload::Image(frame)) => {
                if frame.camera != position {
                    self.metrics.record_invalid();
                    return Err(IngestionError::PayloadMismatch {
                        sensor_id: packet.sensor_id,
                        expected: format!("camera {position}"),
                        actual: format!("camera {}", frame.camera),
                    });
                }
                if !frame.is_well_formed() {
                    self.metrics.record_invalid();
                    return Err(IngestionError::MalformedFrame {
                        message: format!(
                            "{}x{} {:?} expects {} bytes, got {}",
                            frame.width,
                            frame.height,
                            frame.format,
                            frame.expected_len(),
                            frame.data.len()
                        ),
                        sensor_id: packet.sensor_id,
                    });
                }

                let overwritten = self.frames.publish(Arc::new(frame));
                self.metrics.record_frame(overwritten);
                ::metrics::counter!("adas_frames_received_total", "camera" => position.as_str())
                    .increment(1);
                if overwritten {
                    ::metrics::counter!("adas_frames_overwritten_total", "camera" => position.as_str())
                        .increment(1);
                }
                trace!(sensor_id = %packet.sensor_id, camera = %position, overwritten, "frame stored");
                Ok(())
            }
            (SensorType::LaneInvasion, SensorPayload::LaneInvasion(event)) => {
                trace!(
                    sensor_id = %packet.sensor_id,
                    frame_id = event.frame_id,
                    markings = ?event.crossed_markings,
                    "lane event latched"
                );
                self.lane_events.push(event);
                self.metrics.record_lane_event();
                ::metrics::counter!("adas_lane_events_total").increment(1);
                Ok(())
            }
            (expected, payload) => {
                self.metrics.record_invalid();
                Err(IngestionError::PayloadMismatch {
                    sensor_id: packet.sensor_id,
                    expected: expected.as_str().to_string(),
                    actual: match payload {
                        SensorPayload::Image(_) => "image",
                        SensorPayload::LaneInvasion(_) => "lane_invasion",
                    }
                    .to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use contracts::{CameraPosition, FrameStore, ImageFrame, LaneEvent, PixelFormat};

    fn router() -> (PacketRouter, Arc<FrameBuffers>, Arc<LaneEventLatch>, Arc<IngestionMetrics>) {
        let frames = Arc::new(FrameBuffers::new());
        let lane = Arc::new(LaneEventLatch::new());
        let metrics = Arc::new(IngestionMetrics::new());
        (
            PacketRouter::new(frames.clone(), lane.clone(), metrics.clone()),
            frames,
            lane,
            metrics,
        )
    }

    fn image_packet(camera: CameraPosition, len: usize) -> SensorPacket {
        SensorPacket {
            sensor_id: format!("camera_{camera}"),
            sensor_type: SensorType::Camera(camera),
            timestamp: 0.1,
            frame_id: Some(1),
            payload: SensorPayload::Image(ImageFrame {
                camera,
                width: 2,
                height: 2,
                format: PixelFormat::Bgra8,
                timestamp: 0.1,
                frame_id: Some(1),
                data: Bytes::from(vec![0u8; len]),
            }),
        }
    }

    #[test]
    fn test_image_routed_to_slot() {
        let (router, frames, _, metrics) = router();
        router
            .route(
                SensorType::Camera(CameraPosition::Left),
                image_packet(CameraPosition::Left, 16),
            )
            .unwrap();

        assert!(frames.latest(CameraPosition::Left).is_some());
        assert_eq!(metrics.snapshot().frames_received, 1);
    }

    #[test]
    fn test_malformed_frame_rejected() {
        let (router, frames, _, metrics) = router();
        let err = router
            .route(
                SensorType::Camera(CameraPosition::Left),
                image_packet(CameraPosition::Left, 15),
            )
            .unwrap_err();

        assert!(matches!(err, IngestionError::MalformedFrame { .. }));
        assert!(frames.latest(CameraPosition::Left).is_none());
        assert_eq!(metrics.snapshot().invalid_packets, 1);
    }

    #[test]
    fn test_wrong_camera_rejected() {
        let (router, frames, _, _) = router();
        let err = router
            .route(
                SensorType::Camera(CameraPosition::Left),
                image_packet(CameraPosition::Right, 16),
            )
            .unwrap_err();

        assert!(matches!(err, IngestionError::PayloadMismatch { .. }));
        assert!(frames.live_cameras().is_empty());
    }

    #[test]
    fn test_lane_event_latched() {
        let (router, _, lane, metrics) = router();
        router
            .route(
                SensorType::LaneInvasion,
                SensorPacket {
                    sensor_id: "lane_invasion".to_string(),
                    sensor_type: SensorType::LaneInvasion,
                    timestamp: 2.0,
                    frame_id: Some(40),
                    payload: SensorPayload::LaneInvasion(LaneEvent {
                        timestamp: 2.0,
                        frame_id: 40,
                        crossed_markings: vec!["Solid".to_string()],
                    }),
                },
            )
            .unwrap();

        assert_eq!(lane.drain().len(), 1);
        assert_eq!(metrics.snapshot().lane_events, 1);
    }

    #[test]
    fn test_image_from_lane_sensor_rejected() {
        let (router, _, lane, _) = router();
        let result = router.route(
            SensorType::LaneInvasion,
            image_packet(CameraPosition::Front, 16),
        );
        assert!(result.is_err());
        assert_eq!(lane.pending(), 0);
    }
}
