//! Proximity monitor
//!
//! Nearest-agent distance and relative speed, mapped to a raw level.

use contracts::{ActorId, AgentState, AlertLevel, Vector3};
use nalgebra::Vector3 as NVector3;

/// Distance below which the proximity channel is Warn (m)
pub const WARN_DISTANCE_M: f64 = 8.0;
/// Distance below which the proximity channel is Near (m)
pub const NEAR_DISTANCE_M: f64 = 15.0;

pub fn proximity_level(distance_m: f64) -> AlertLevel {
    if distance_m < WARN_DISTANCE_M {
        AlertLevel::Warn
    } else if distance_m < NEAR_DISTANCE_M {
        AlertLevel::Near
    } else {
        AlertLevel::Clear
    }
}

/// Nearest other agent seen by a scan
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearestAgent {
    pub id: ActorId,
    pub distance_m: f64,
    /// Agent speed minus ego speed (m/s)
    pub rel_speed_mps: f64,
}

/// Result of one proximity scan
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProximityObservation {
    pub nearest: Option<NearestAgent>,
    pub level: AlertLevel,
}

impl ProximityObservation {
    pub fn distance_m(&self) -> Option<f64> {
        self.nearest.map(|n| n.distance_m)
    }
}

#[inline]
fn to_na(v: &Vector3) -> NVector3<f64> {
    NVector3::new(v.x, v.y, v.z)
}

/// Scan every agent except `ego` for the nearest one.
///
/// Ties keep the first agent encountered.
pub fn scan(agents: &[AgentState], ego: &AgentState) -> ProximityObservation {
    let ego_position = to_na(&ego.position);
    let ego_speed = to_na(&ego.velocity).norm();

    let mut nearest: Option<NearestAgent> = None;
    for agent in agents.iter().filter(|a| a.id != ego.id) {
        let distance_m = (to_na(&agent.position) - ego_position).norm();
        if nearest.map_or(true, |n| distance_m < n.distance_m) {
            nearest = Some(NearestAgent {
                id: agent.id,
                distance_m,
                rel_speed_mps: to_na(&agent.velocity).norm() - ego_speed,
            });
        }
    }

    ProximityObservation {
        level: nearest.map_or(AlertLevel::Clear, |n| proximity_level(n.distance_m)),
        nearest,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent(id: ActorId, x: f64, y: f64, vx: f64) -> AgentState {
        AgentState {
            id,
            position: Vector3::new(x, y, 0.0),
            velocity: Vector3::new(vx, 0.0, 0.0),
        }
    }

    #[test]
    fn test_level_thresholds() {
        assert_eq!(proximity_level(7.9), AlertLevel::Warn);
        assert_eq!(proximity_level(8.0), AlertLevel::Near);
        assert_eq!(proximity_level(14.9), AlertLevel::Near);
        assert_eq!(proximity_level(15.0), AlertLevel::Clear);
    }

    #[test]
    fn test_nearest_excludes_ego() {
        let ego = agent(1, 0.0, 0.0, 10.0);
        let agents = [ego, agent(2, 20.0, 0.0, 12.0), agent(3, 3.0, 4.0, 4.0)];

        let obs = scan(&agents, &ego);
        let nearest = obs.nearest.unwrap();
        assert_eq!(nearest.id, 3);
        assert!((nearest.distance_m - 5.0).abs() < 1e-9);
        assert!((nearest.rel_speed_mps + 6.0).abs() < 1e-9);
        assert_eq!(obs.level, AlertLevel::Warn);
    }

    #[test]
    fn test_no_agents_is_clear() {
        let ego = agent(1, 0.0, 0.0, 0.0);
        let obs = scan(&[ego], &ego);
        assert_eq!(obs, ProximityObservation::default());
        assert!(obs.distance_m().is_none());
    }

    #[test]
    fn test_far_agent_clear_but_reported() {
        let ego = agent(1, 0.0, 0.0, 0.0);
        let obs = scan(&[agent(9, 0.0, 40.0, 0.0)], &ego);
        assert_eq!(obs.level, AlertLevel::Clear);
        assert_eq!(obs.distance_m(), Some(40.0));
    }
}
