//! Alert engine configuration contracts that can be shared across crates.

use serde::{Deserialize, Serialize};

use crate::config::{
    default_confidence_threshold, default_downscale_factor, default_inference_size,
    default_skip_frames, default_vehicle_keywords, default_warning_clear_time,
};
use crate::AudioCue;

/// Alert engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEngineConfig {
    /// Run blind-spot detection every N ticks (>= 1)
    pub skip_frames: u32,

    /// Hysteresis window in seconds
    pub warning_clear_time: f64,

    /// Scale applied to a frame before inference
    pub downscale_factor: f32,

    /// Inference size hint passed to the classifier
    pub inference_size: u32,

    /// Lowercase vehicle keywords (substring match)
    pub vehicle_keywords: Vec<String>,

    /// Detections below this confidence are ignored
    pub confidence_threshold: f32,

    /// Cues that may be fired on a rising edge
    pub enabled_cues: Vec<AudioCue>,
}

impl Default for AlertEngineConfig {
    fn default() -> Self {
        Self {
            skip_frames: default_skip_frames(),
            warning_clear_time: default_warning_clear_time(),
            downscale_factor: default_downscale_factor(),
            inference_size: default_inference_size(),
            vehicle_keywords: default_vehicle_keywords(),
            confidence_threshold: default_confidence_threshold(),
            enabled_cues: AudioCue::ALL.to_vec(),
        }
    }
}

impl AlertEngineConfig {
    pub fn cue_enabled(&self, cue: AudioCue) -> bool {
        self.enabled_cues.contains(&cue)
    }
}
