//! RuntimeGraph - Actor Factory output
//!
//! Runtime actor handles for the spawned rig.

use std::collections::HashMap;

use crate::SensorType;

/// Simulator actor handle type
pub type ActorId = u32;

/// Handle of a spawned sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorHandle {
    pub actor_id: ActorId,
    pub sensor_type: SensorType,
}

/// Runtime actor graph
///
/// Contains every actor spawned for a session, so teardown can find them.
#[derive(Debug, Clone, Default)]
pub struct RuntimeGraph {
    /// Ego vehicle
    pub ego: Option<ActorId>,

    /// Sensor ID -> handle
    pub sensors: HashMap<String, SensorHandle>,

    /// Background traffic vehicles
    pub traffic: Vec<ActorId>,
}

impl RuntimeGraph {
    /// Create empty RuntimeGraph
    pub fn new() -> Self {
        Self::default()
    }

    /// Register ego vehicle
    pub fn register_ego(&mut self, actor_id: ActorId) {
        self.ego = Some(actor_id);
    }

    /// Register sensor
    pub fn register_sensor(&mut self, sensor_id: String, actor_id: ActorId, sensor_type: SensorType) {
        self.sensors.insert(
            sensor_id,
            SensorHandle {
                actor_id,
                sensor_type,
            },
        );
    }

    /// Register traffic vehicles
    pub fn register_traffic(&mut self, actors: impl IntoIterator<Item = ActorId>) {
        self.traffic.extend(actors);
    }

    /// All actor handles in teardown order: sensors, traffic, ego
    pub fn all_actor_ids(&self) -> Vec<ActorId> {
        let mut sensor_ids: Vec<ActorId> = self.sensors.values().map(|s| s.actor_id).collect();
        sensor_ids.sort_unstable();
        sensor_ids
            .into_iter()
            .chain(self.traffic.iter().copied())
            .chain(self.ego)
            .collect()
    }
}
