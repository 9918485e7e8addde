//! ObservationRecord - Alert Engine output
//!
//! One append-only log row per raw observation.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::{AlertLevel, Side};

/// Label written for proximity-scan rows.
pub const PROXIMITY_LABEL: &str = "vehicle_ahead";

/// Which producer emitted the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Detection,
    Proximity,
    Lane,
}

/// Raw observation log row
///
/// Optional columns stay empty in the serialized row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationRecord {
    pub kind: RecordKind,

    /// Wall-clock time the row was produced
    pub recorded_at: DateTime<Local>,

    /// Simulation time (seconds)
    pub sim_time: f64,

    pub label: Option<String>,
    pub confidence: Option<f32>,
    pub side: Option<Side>,
    pub level: Option<AlertLevel>,
    pub lane_departure: bool,
    pub distance_m: Option<f64>,
    pub rel_speed_mps: Option<f64>,
}

impl ObservationRecord {
    fn empty(kind: RecordKind, sim_time: f64) -> Self {
        Self {
            kind,
            recorded_at: Local::now(),
            sim_time,
            label: None,
            confidence: None,
            side: None,
            level: None,
            lane_departure: false,
            distance_m: None,
            rel_speed_mps: None,
        }
    }

    /// Row for one vehicle-category detection on a blind-spot camera.
    pub fn detection(
        sim_time: f64,
        label: impl Into<String>,
        confidence: f32,
        side: Side,
        level: AlertLevel,
    ) -> Self {
        Self {
            label: Some(label.into()),
            confidence: Some(confidence),
            side: Some(side),
            level: Some(level),
            ..Self::empty(RecordKind::Detection, sim_time)
        }
    }

    /// Row for a proximity scan that found at least one agent.
    pub fn proximity(sim_time: f64, distance_m: f64, rel_speed_mps: f64) -> Self {
        Self {
            label: Some(PROXIMITY_LABEL.to_string()),
            distance_m: Some(distance_m),
            rel_speed_mps: Some(rel_speed_mps),
            ..Self::empty(RecordKind::Proximity, sim_time)
        }
    }

    /// Row for a tick in which lane boundary crossings arrived.
    pub fn lane(sim_time: f64) -> Self {
        Self {
            level: Some(AlertLevel::Warn),
            lane_departure: true,
            ..Self::empty(RecordKind::Lane, sim_time)
        }
    }
}
