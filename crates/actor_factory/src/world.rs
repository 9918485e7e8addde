//! 运动学仿真世界
//!
//! 直线多车道道路：自车由 `VehicleControl` 驱动 (自行车模型)，
//! 背景车辆沿车道匀速行驶，并在自车前后一定范围内循环出现。
//! 自车跨越车道线时产生 `LaneEvent`。

use std::collections::HashMap;
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use contracts::{ActorId, AgentState, LaneEvent, Vector3, VehicleControl, WorldSnapshot};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, trace};

/// Lane width (m)
pub const LANE_WIDTH_M: f64 = 3.5;

/// Lanes are indexed -1, 0, 1 (left to right); beyond that is road edge.
const OUTER_LANE_INDEX: i32 = 1;

const MAX_ACCEL_MPS2: f64 = 4.0;
const MAX_BRAKE_MPS2: f64 = 8.0;
const DRAG_PER_S: f64 = 0.05;
const MAX_FORWARD_MPS: f64 = 50.0;
const MAX_REVERSE_MPS: f64 = 8.0;
const MAX_STEER_RAD: f64 = 0.6;
const WHEELBASE_M: f64 = 2.9;

/// Speed limit traffic is scaled against (50 km/h)
const TRAFFIC_REFERENCE_MPS: f64 = 13.9;
/// Traffic is kept within this longitudinal distance of ego
const TRAFFIC_WRAP_M: f64 = 120.0;
const MIN_SPAWN_GAP_M: f64 = 6.0;
const SPAWN_ATTEMPTS: usize = 5;

const TRAFFIC_LABELS: [&str; 5] = ["car", "car", "car", "truck", "bus"];

/// One simulated vehicle
#[derive(Debug, Clone)]
pub(crate) struct VehicleBody {
    pub(crate) id: ActorId,
    pub(crate) position: Vector3,
    /// Yaw in radians, 0 = +x
    pub(crate) heading: f64,
    /// Signed speed along heading (m/s)
    pub(crate) speed: f64,
    pub(crate) label: String,
    pub(crate) autopilot: bool,
}

impl VehicleBody {
    fn velocity(&self) -> Vector3 {
        Vector3::new(
            self.heading.cos() * self.speed,
            self.heading.sin() * self.speed,
            0.0,
        )
    }

    fn state(&self) -> AgentState {
        AgentState {
            id: self.id,
            position: self.position,
            velocity: self.velocity(),
        }
    }
}

pub(crate) struct World {
    pub(crate) frame: u64,
    pub(crate) time: f64,
    pub(crate) fixed_delta: f64,
    pub(crate) vehicles: Vec<VehicleBody>,
    pub(crate) controls: HashMap<ActorId, VehicleControl>,
    pub(crate) lane_senders: HashMap<ActorId, Sender<LaneEvent>>,
    lane_index: HashMap<ActorId, i32>,
    rng: StdRng,
}

impl World {
    fn new(seed: u64) -> Self {
        Self {
            frame: 0,
            time: 0.0,
            fixed_delta: 0.05,
            vehicles: Vec::new(),
            controls: HashMap::new(),
            lane_senders: HashMap::new(),
            lane_index: HashMap::new(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub(crate) fn vehicle(&self, id: ActorId) -> Option<&VehicleBody> {
        self.vehicles.iter().find(|v| v.id == id)
    }

    pub(crate) fn add_vehicle(&mut self, body: VehicleBody) {
        self.lane_index.insert(body.id, lane_of(body.position.y));
        self.vehicles.push(body);
    }

    pub(crate) fn remove_vehicle(&mut self, id: ActorId) {
        self.vehicles.retain(|v| v.id != id);
        self.controls.remove(&id);
        self.lane_index.remove(&id);
    }

    /// Pick a free spot near `anchor` for a new traffic vehicle.
    pub(crate) fn traffic_spawn_body(&mut self, id: ActorId, anchor: Vector3) -> Option<VehicleBody> {
        for _ in 0..SPAWN_ATTEMPTS {
            let lane = self.rng.random_range(-OUTER_LANE_INDEX..=OUTER_LANE_INDEX);
            let dx = self.rng.random_range(-TRAFFIC_WRAP_M..TRAFFIC_WRAP_M);
            let position = Vector3::new(anchor.x + dx, f64::from(lane) * LANE_WIDTH_M, 0.0);

            let blocked = self.vehicles.iter().any(|v| {
                let ddx = v.position.x - position.x;
                let ddy = v.position.y - position.y;
                (ddx * ddx + ddy * ddy).sqrt() < MIN_SPAWN_GAP_M
            });
            if blocked {
                continue;
            }

            // 10-40% slower than the reference speed
            let pct: u32 = self.rng.random_range(10..=40);
            let speed = TRAFFIC_REFERENCE_MPS * (1.0 - f64::from(pct) / 100.0);
            let label = TRAFFIC_LABELS[self.rng.random_range(0..TRAFFIC_LABELS.len())];

            return Some(VehicleBody {
                id,
                position,
                heading: 0.0,
                speed,
                label: label.to_string(),
                autopilot: true,
            });
        }
        None
    }

    /// Advance one fixed step, publishing any lane crossing of `ego`.
    fn step(&mut self, ego: ActorId) {
        let dt = self.fixed_delta;
        self.frame += 1;
        self.time += dt;

        let anchor_x = self.vehicle(ego).map(|v| v.position.x).unwrap_or(0.0);

        for body in &mut self.vehicles {
            if body.autopilot {
                body.position.x += body.speed * dt;
                let offset = body.position.x - anchor_x;
                if offset > TRAFFIC_WRAP_M {
                    body.position.x -= 2.0 * TRAFFIC_WRAP_M;
                } else if offset < -TRAFFIC_WRAP_M {
                    body.position.x += 2.0 * TRAFFIC_WRAP_M;
                }
            } else {
                let control = self.controls.get(&body.id).copied().unwrap_or_default();
                integrate(body, &control, dt);
            }
        }

        let mut events: Vec<LaneEvent> = Vec::new();
        if let Some(y) = self.vehicle(ego).map(|body| body.position.y) {
            let lane = lane_of(y);
            let previous = self.lane_index.insert(ego, lane).unwrap_or(lane);
            if previous != lane {
                let marking = if lane.abs() > OUTER_LANE_INDEX || previous.abs() > OUTER_LANE_INDEX {
                    "Solid"
                } else {
                    "Broken"
                };
                debug!(from = previous, to = lane, marking, "ego crossed lane marking");
                events.push(LaneEvent {
                    timestamp: self.time,
                    frame_id: self.frame,
                    crossed_markings: vec![marking.to_string()],
                });
            }
        }

        for event in &events {
            self.lane_senders
                .retain(|_, sender| sender.send(event.clone()).is_ok());
        }

        trace!(frame = self.frame, time = self.time, "world stepped");
    }

    fn snapshot(&self, ego: ActorId) -> Option<WorldSnapshot> {
        let ego_state = self.vehicle(ego)?.state();
        Some(WorldSnapshot {
            frame: self.frame,
            timestamp: self.time,
            ego: ego_state,
            agents: self.vehicles.iter().map(VehicleBody::state).collect(),
        })
    }
}

fn lane_of(y: f64) -> i32 {
    (y / LANE_WIDTH_M).round() as i32
}

fn integrate(body: &mut VehicleBody, control: &VehicleControl, dt: f64) {
    let direction = if control.reverse { -1.0 } else { 1.0 };
    let mut v = body.speed + f64::from(control.throttle) * MAX_ACCEL_MPS2 * direction * dt;

    let decel = (f64::from(control.brake) * MAX_BRAKE_MPS2 + DRAG_PER_S * v.abs()) * dt;
    if v.abs() <= decel {
        v = 0.0;
    } else {
        v -= decel * v.signum();
    }
    v = v.clamp(-MAX_REVERSE_MPS, MAX_FORWARD_MPS);

    let yaw_rate = v * (f64::from(control.steer) * MAX_STEER_RAD).tan() / WHEELBASE_M;
    body.heading += yaw_rate * dt;
    body.speed = v;
    body.position.x += body.heading.cos() * v * dt;
    body.position.y += body.heading.sin() * v * dt;
}

/// Shared handle to the mock world
///
/// Cloned into sensor threads and the ground-truth classifier.
#[derive(Clone)]
pub struct WorldHandle(Arc<Mutex<World>>);

impl WorldHandle {
    pub(crate) fn new(seed: u64) -> Self {
        Self(Arc::new(Mutex::new(World::new(seed))))
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, World> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current simulation time (seconds)
    pub fn time(&self) -> f64 {
        self.lock().time
    }

    /// Current simulation frame
    pub fn frame(&self) -> u64 {
        self.lock().frame
    }

    pub(crate) fn step(&self, ego: ActorId) -> Option<WorldSnapshot> {
        let mut world = self.lock();
        world.step(ego);
        world.snapshot(ego)
    }

    pub(crate) fn snapshot(&self, ego: ActorId) -> Option<WorldSnapshot> {
        self.lock().snapshot(ego)
    }

    /// The manually driven vehicle plus every other vehicle.
    pub(crate) fn ego_and_traffic(&self) -> Option<(VehicleBody, Vec<VehicleBody>)> {
        let world = self.lock();
        let ego = world.vehicles.iter().find(|v| !v.autopilot)?.clone();
        let others = world
            .vehicles
            .iter()
            .filter(|v| v.id != ego.id)
            .cloned()
            .collect();
        Some((ego, others))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ego_body(id: ActorId) -> VehicleBody {
        VehicleBody {
            id,
            position: Vector3::default(),
            heading: 0.0,
            speed: 0.0,
            label: "ego".into(),
            autopilot: false,
        }
    }

    #[test]
    fn test_throttle_accelerates_and_brake_stops() {
        let mut body = ego_body(1);
        let throttle = VehicleControl {
            throttle: 1.0,
            ..Default::default()
        };
        for _ in 0..20 {
            integrate(&mut body, &throttle, 0.05);
        }
        assert!(body.speed > 3.0);
        assert!(body.position.x > 0.0);

        let brake = VehicleControl {
            brake: 1.0,
            ..Default::default()
        };
        for _ in 0..40 {
            integrate(&mut body, &brake, 0.05);
        }
        assert_eq!(body.speed, 0.0);
    }

    #[test]
    fn test_reverse_moves_backwards() {
        let mut body = ego_body(1);
        let control = VehicleControl {
            throttle: 1.0,
            reverse: true,
            ..Default::default()
        };
        for _ in 0..10 {
            integrate(&mut body, &control, 0.05);
        }
        assert!(body.speed < 0.0);
        assert!(body.position.x < 0.0);
    }

    #[test]
    fn test_lane_change_emits_event() {
        let handle = WorldHandle::new(1);
        let (tx, rx) = std::sync::mpsc::channel();
        {
            let mut world = handle.lock();
            let mut ego = ego_body(1);
            ego.position.y = 1.74;
            ego.speed = 1.0;
            ego.heading = std::f64::consts::FRAC_PI_2;
            world.add_vehicle(ego);
            world.lane_senders.insert(99, tx);
        }

        handle.step(1);
        let event = rx.try_recv().unwrap();
        assert_eq!(event.frame_id, 1);
        assert_eq!(event.crossed_markings, vec!["Broken".to_string()]);
    }

    #[test]
    fn test_traffic_wraps_around_ego() {
        let handle = WorldHandle::new(1);
        {
            let mut world = handle.lock();
            world.add_vehicle(ego_body(1));
            world.add_vehicle(VehicleBody {
                id: 2,
                position: Vector3::new(TRAFFIC_WRAP_M - 0.1, 0.0, 0.0),
                heading: 0.0,
                speed: 10.0,
                label: "car".into(),
                autopilot: true,
            });
        }
        let snapshot = handle.step(1).unwrap();
        let npc = snapshot.agents.iter().find(|a| a.id == 2).unwrap();
        assert!(npc.position.x < 0.0);
    }
}
