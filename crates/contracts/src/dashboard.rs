//! Dashboard collaborators
//!
//! Rendering, audio playback and input decoding live outside the engine.
//! The session loop talks to them only through these traits.

use serde::{Deserialize, Serialize};

use crate::{AlertLevel, AlertSnapshot, AudioCue, CameraPosition, ControlIntent, VehicleControl};

/// Everything the renderer needs for one frame of the HUD.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardView {
    pub tick: u64,
    /// Simulation time (seconds)
    pub sim_time: f64,
    pub alerts: AlertSnapshot,
    pub speed_kph: f64,
    pub control: VehicleControl,
    /// Distance to the nearest agent, if any
    pub nearest_distance_m: Option<f64>,
    /// Cameras that have delivered at least one frame
    pub live_cameras: Vec<CameraPosition>,
}

impl DashboardView {
    /// Header text shown above the HUD.
    pub fn headline(&self) -> &'static str {
        match self.alerts.overall {
            AlertLevel::Warn => "WARNING!",
            AlertLevel::Near => "CAUTION",
            AlertLevel::Clear => "ALL CLEAR",
        }
    }
}

/// Renderer verdict after drawing a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderControl {
    Continue,
    Quit,
}

/// HUD renderer
pub trait DashboardRenderer: Send {
    fn render(&mut self, view: &DashboardView) -> RenderControl;
}

/// Fire-and-forget audio output
pub trait AudioSink: Send + Sync {
    fn play(&self, cue: AudioCue);
}

/// Decoded driver input, polled once per tick
pub trait ControlSource: Send {
    fn poll(&mut self, control: &VehicleControl) -> ControlIntent;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(overall: AlertLevel) -> DashboardView {
        DashboardView {
            tick: 0,
            sim_time: 0.0,
            alerts: AlertSnapshot {
                overall,
                ..Default::default()
            },
            speed_kph: 0.0,
            control: VehicleControl::default(),
            nearest_distance_m: None,
            live_cameras: Vec::new(),
        }
    }

    #[test]
    fn test_headline() {
        assert_eq!(view(AlertLevel::Warn).headline(), "WARNING!");
        assert_eq!(view(AlertLevel::Near).headline(), "CAUTION");
        assert_eq!(view(AlertLevel::Clear).headline(), "ALL CLEAR");
    }
}
