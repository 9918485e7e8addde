//! 盲区检测适配器
//!
//! 缩放输入帧、调用分类器、过滤车辆类别，并按侧别的占用区间给出原始告警等级。

use std::sync::Arc;

use bytes::Bytes;
use contracts::{
    AlertEngineConfig, AlertLevel, BoundingBox, Classifier, ContractError, Detection, ImageFrame,
    PixelFormat, Side,
};
use image::imageops::{self, FilterType};
use image::RgbImage;
use tracing::{debug, trace, warn};

/// Left occupancy window, as fractions of frame width (exclusive)
pub const LEFT_ZONE: (f32, f32) = (0.05, 0.35);
/// Right occupancy window, as fractions of frame width (exclusive)
pub const RIGHT_ZONE: (f32, f32) = (0.65, 0.95);
/// Box height ratio above which an in-zone vehicle escalates to Warn
pub const WARN_HEIGHT_RATIO: f32 = 0.25;

/// Raw level implied by one box on `side`, in a `width` x `height` frame.
pub fn zone_level(side: Side, bbox: &BoundingBox, width: f32, height: f32) -> AlertLevel {
    let (lo, hi) = match side {
        Side::Left => LEFT_ZONE,
        Side::Right => RIGHT_ZONE,
    };
    let cx = bbox.center_x();
    if cx <= lo * width || cx >= hi * width {
        return AlertLevel::Clear;
    }
    if bbox.height() > WARN_HEIGHT_RATIO * height {
        AlertLevel::Warn
    } else {
        AlertLevel::Near
    }
}

/// Lowercased substring match against the vehicle keyword set.
pub fn is_vehicle_label(label: &str, keywords: &[String]) -> bool {
    let label = label.to_lowercase();
    keywords.iter().any(|k| label.contains(k.as_str()))
}

/// A vehicle-category detection together with the level it implies
#[derive(Debug, Clone, PartialEq)]
pub struct ZonedDetection {
    pub detection: Detection,
    pub level: AlertLevel,
}

/// Outcome of one adapter invocation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectionResult {
    /// Highest level over all retained detections
    pub level: AlertLevel,
    /// Retained vehicle detections, in classifier order
    pub detections: Vec<ZonedDetection>,
}

/// Wraps the classifier with the blind-spot region policy
pub struct DetectionAdapter {
    classifier: Arc<dyn Classifier>,
    downscale_factor: f32,
    inference_size: u32,
    vehicle_keywords: Vec<String>,
    confidence_threshold: f32,
}

impl DetectionAdapter {
    pub fn new(classifier: Arc<dyn Classifier>, config: &AlertEngineConfig) -> Self {
        Self {
            classifier,
            downscale_factor: config.downscale_factor,
            inference_size: config.inference_size,
            vehicle_keywords: config.vehicle_keywords.clone(),
            confidence_threshold: config.confidence_threshold,
        }
    }

    pub fn classifier_name(&self) -> &str {
        self.classifier.name()
    }

    /// Run the classifier on `frame` and evaluate the `side` occupancy window.
    ///
    /// Failures and empty results yield Clear.
    pub fn detect(&self, frame: &ImageFrame, side: Side) -> DetectionResult {
        let scaled = match downscale(frame, self.downscale_factor) {
            Ok(scaled) => scaled,
            Err(e) => {
                warn!(side = %side, error = %e, "frame could not be prepared for inference");
                return DetectionResult::default();
            }
        };

        let raw = match self.classifier.classify(&scaled, self.inference_size) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(
                    side = %side,
                    classifier = self.classifier.name(),
                    error = %e,
                    "classifier failed, treating as clear"
                );
                return DetectionResult::default();
            }
        };
        if raw.is_empty() {
            debug!(side = %side, "no detections");
            return DetectionResult::default();
        }

        let width = scaled.width as f32;
        let height = scaled.height as f32;
        let detections: Vec<ZonedDetection> = raw
            .into_iter()
            .filter(|d| d.confidence >= self.confidence_threshold)
            .filter(|d| is_vehicle_label(&d.label, &self.vehicle_keywords))
            .map(|detection| {
                let level = zone_level(side, &detection.bbox, width, height);
                trace!(
                    side = %side,
                    label = %detection.label,
                    confidence = detection.confidence,
                    center_x = detection.bbox.center_x(),
                    box_height = detection.bbox.height(),
                    level = %level,
                    "vehicle detection"
                );
                ZonedDetection { detection, level }
            })
            .collect();

        let level = detections
            .iter()
            .map(|d| d.level)
            .max()
            .unwrap_or_default();

        DetectionResult { level, detections }
    }
}

/// Scale `frame` by `factor`, producing an RGB frame.
///
/// A factor of 1 returns the frame unchanged.
pub fn downscale(frame: &ImageFrame, factor: f32) -> Result<ImageFrame, ContractError> {
    if !frame.is_well_formed() {
        return Err(ContractError::frame_decode(
            frame.camera.as_str(),
            format!(
                "expected {} bytes for {}x{}, got {}",
                frame.expected_len(),
                frame.width,
                frame.height,
                frame.data.len()
            ),
        ));
    }
    if (factor - 1.0).abs() < f32::EPSILON {
        return Ok(frame.clone());
    }

    let rgb = to_rgb_image(frame)?;
    let width = ((frame.width as f32 * factor).round() as u32).max(1);
    let height = ((frame.height as f32 * factor).round() as u32).max(1);
    let resized = imageops::resize(&rgb, width, height, FilterType::Triangle);

    Ok(ImageFrame {
        camera: frame.camera,
        width,
        height,
        format: PixelFormat::Rgb8,
        timestamp: frame.timestamp,
        frame_id: frame.frame_id,
        data: Bytes::from(resized.into_raw()),
    })
}

fn to_rgb_image(frame: &ImageFrame) -> Result<RgbImage, ContractError> {
    let pixels: Vec<u8> = match frame.format {
        PixelFormat::Rgb8 => frame.data.to_vec(),
        PixelFormat::Rgba8 => frame
            .data
            .chunks_exact(4)
            .flat_map(|p| [p[0], p[1], p[2]])
            .collect(),
        PixelFormat::Bgra8 => frame
            .data
            .chunks_exact(4)
            .flat_map(|p| [p[2], p[1], p[0]])
            .collect(),
    };
    RgbImage::from_raw(frame.width, frame.height, pixels)
        .ok_or_else(|| ContractError::frame_decode(frame.camera.as_str(), "buffer too small"))
}

/// Classifier that never sees anything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullClassifier;

impl Classifier for NullClassifier {
    fn name(&self) -> &str {
        "null"
    }

    fn classify(&self, _frame: &ImageFrame, _target_size: u32) -> Result<Vec<Detection>, ContractError> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
pub(crate) use scripted::ScriptedClassifier;

#[cfg(test)]
mod scripted {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Mutex, PoisonError};

    use contracts::{CameraPosition, Classifier, ContractError, Detection, ImageFrame};

    /// Deterministic classifier returning a configured answer per camera
    #[derive(Debug, Default)]
    pub struct ScriptedClassifier {
        responses: Mutex<HashMap<CameraPosition, Result<Vec<Detection>, String>>>,
        calls: AtomicUsize,
        /// (width, height, target_size) of the most recent input
        last_input: Mutex<Option<(u32, u32, u32)>>,
    }

    impl ScriptedClassifier {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set_detections(&self, camera: CameraPosition, detections: Vec<Detection>) {
            self.responses
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(camera, Ok(detections));
        }

        pub fn set_failure(&self, camera: CameraPosition, message: impl Into<String>) {
            self.responses
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(camera, Err(message.into()));
        }

        pub fn clear(&self, camera: CameraPosition) {
            self.responses
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&camera);
        }

        /// Number of `classify` invocations so far
        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn last_input(&self) -> Option<(u32, u32, u32)> {
            *self.last_input.lock().unwrap_or_else(PoisonError::into_inner)
        }
    }

    impl Classifier for ScriptedClassifier {
        fn name(&self) -> &str {
            "scripted"
        }

        fn classify(&self, frame: &ImageFrame, target_size: u32) -> Result<Vec<Detection>, ContractError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_input.lock().unwrap_or_else(PoisonError::into_inner) =
                Some((frame.width, frame.height, target_size));

            match self
                .responses
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .get(&frame.camera)
            {
                Some(Ok(detections)) => Ok(detections.clone()),
                Some(Err(message)) => Err(ContractError::classifier(message.clone())),
                None => Ok(Vec::new()),
            }
        }
    }
}
