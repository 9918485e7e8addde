//! Ground-truth classifier for the mock world
//!
//! Projects traffic vehicles into the camera that produced a frame with a
//! pinhole model, yielding the boxes a perfect detector would report.

use contracts::{
    BoundingBox, CameraConfig, CameraPosition, Classifier, ContractError, Detection, ImageFrame,
};

use crate::world::WorldHandle;

/// Vehicle height above the road (m)
const VEHICLE_HEIGHT_M: f64 = 1.5;
/// Visible half-extent across the optical axis, side cameras see the vehicle flank
const SIDE_HALF_EXTENT_M: f64 = 2.2;
const END_HALF_EXTENT_M: f64 = 0.95;
/// Objects closer than this to the lens are not reported
const MIN_DEPTH_M: f64 = 0.5;
/// Objects farther than this are below detector resolution
const MAX_DEPTH_M: f64 = 60.0;
const GROUND_TRUTH_CONFIDENCE: f32 = 0.9;

/// Classifier reading the mock world's true vehicle positions
pub struct GroundTruthClassifier {
    world: WorldHandle,
    fov_deg: f64,
}

impl GroundTruthClassifier {
    pub fn new(world: WorldHandle, fov_deg: f64) -> Self {
        Self { world, fov_deg }
    }
}

impl Classifier for GroundTruthClassifier {
    fn name(&self) -> &str {
        "ground_truth"
    }

    fn classify(
        &self,
        frame: &ImageFrame,
        _target_size: u32,
    ) -> Result<Vec<Detection>, ContractError> {
        let Some((ego, traffic)) = self.world.ego_and_traffic() else {
            return Ok(Vec::new());
        };

        let mount = CameraConfig::mount(frame.camera);
        let yaw = mount.rotation.yaw.to_radians();
        let (look_f, look_r) = (yaw.cos(), yaw.sin());
        let (right_f, right_r) = (-yaw.sin(), yaw.cos());

        let w = f64::from(frame.width);
        let h = f64::from(frame.height);
        let focal = (w / 2.0) / (self.fov_deg.to_radians() / 2.0).tan();
        let cam_height = mount.location.z;
        let half_extent = match frame.camera {
            CameraPosition::Left | CameraPosition::Right => SIDE_HALF_EXTENT_M,
            CameraPosition::Front | CameraPosition::Rear => END_HALF_EXTENT_M,
        };

        let (sin_h, cos_h) = ego.heading.sin_cos();
        let mut detections = Vec::new();

        for other in &traffic {
            let dx = other.position.x - ego.position.x;
            let dy = other.position.y - ego.position.y;

            // world -> ego frame (forward, right), then relative to the lens
            let fwd = dx * cos_h + dy * sin_h - mount.location.x;
            let right = -dx * sin_h + dy * cos_h - mount.location.y;

            let depth = fwd * look_f + right * look_r;
            if !(MIN_DEPTH_M..=MAX_DEPTH_M).contains(&depth) {
                continue;
            }
            let lateral = fwd * right_f + right * right_r;

            let x1 = (w / 2.0 + focal * (lateral - half_extent) / depth).max(0.0);
            let x2 = (w / 2.0 + focal * (lateral + half_extent) / depth).min(w);
            if x2 <= x1 {
                continue;
            }
            let y1 = (h / 2.0 + focal * (cam_height - VEHICLE_HEIGHT_M) / depth).max(0.0);
            let y2 = (h / 2.0 + focal * cam_height / depth).min(h);

            detections.push(Detection {
                label: other.label.clone(),
                confidence: GROUND_TRUTH_CONFIDENCE,
                bbox: BoundingBox::new(x1 as f32, y1 as f32, x2 as f32, y2 as f32),
            });
        }

        Ok(detections)
    }
}
