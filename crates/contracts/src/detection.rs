//! Classifier contract
//!
//! The object detector is an opaque, stateless capability: image in,
//! labelled boxes out. Implementations are injected as `Arc<dyn Classifier>`.

use serde::{Deserialize, Serialize};

use crate::{ContractError, ImageFrame};

/// Axis-aligned box in pixel space of the frame handed to the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn center_x(&self) -> f32 {
        (self.x1 + self.x2) / 2.0
    }

    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }
}

/// One box returned by a single classifier invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub label: String,
    /// 0..=1
    pub confidence: f32,
    pub bbox: BoundingBox,
}

/// Vehicle/object classifier.
pub trait Classifier: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Run inference on `frame`.
    ///
    /// `target_size` is the longest-edge inference size hint. Returned boxes
    /// are in the pixel space of `frame`.
    fn classify(&self, frame: &ImageFrame, target_size: u32)
        -> Result<Vec<Detection>, ContractError>;
}
