//! Mock simulator client
//!
//! In-process kinematic world behind `SimulatorClient`, with failure
//! injection for spawn, destroy and tick.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{mpsc, Mutex, MutexGuard, PoisonError};

use contracts::{
    ActorId, CameraPosition, SensorSource, SensorType, Transform, Vector3, VehicleControl,
    WorldSnapshot,
};
use tracing::{debug, info, instrument, warn};

use crate::client::SimulatorClient;
use crate::error::{ActorFactoryError, Result};
use crate::mock_sensor::{MockCamera, MockCameraConfig, MockLaneSensor};
use crate::world::{VehicleBody, WorldHandle};

/// Attribute carrying the configuration ID of a spawned actor
pub const ROLE_NAME_ATTRIBUTE: &str = "role_name";

/// Mock 客户端配置
#[derive(Debug, Default, Clone)]
pub struct MockConfig {
    /// Refuse `connect`
    pub refuse_connection: bool,
    /// Vehicle blueprints that fail to spawn
    pub fail_vehicles: Vec<String>,
    /// Sensor role names that fail to spawn
    pub fail_sensors: Vec<String>,
    /// Actor IDs whose destroy fails
    pub fail_destroy: Vec<ActorId>,
    /// Frame number at which `tick` fails
    pub fail_tick_at: Option<u64>,
    /// Traffic RNG seed (random if None)
    pub seed: Option<u64>,
}

#[derive(Debug, Clone)]
enum ActorRecord {
    Vehicle {
        blueprint: String,
    },
    Sensor {
        blueprint: String,
        parent: ActorId,
        attributes: HashMap<String, String>,
    },
}

/// Mock simulator client
pub struct MockSimulator {
    config: MockConfig,
    world: WorldHandle,
    /// Actor ID 计数器
    next_actor_id: AtomicU32,
    actors: Mutex<HashMap<ActorId, ActorRecord>>,
    connected: AtomicBool,
}

impl MockSimulator {
    /// 创建默认 mock 客户端
    pub fn new() -> Self {
        Self::with_config(MockConfig::default())
    }

    /// 使用配置创建 mock 客户端
    pub fn with_config(config: MockConfig) -> Self {
        let seed = config.seed.unwrap_or_else(rand::random);
        Self {
            config,
            world: WorldHandle::new(seed),
            next_actor_id: AtomicU32::new(1000), // 从 1000 开始，便于识别
            actors: Mutex::new(HashMap::new()),
            connected: AtomicBool::new(false),
        }
    }

    /// Shared view of the world, e.g. for the ground-truth classifier
    pub fn world(&self) -> WorldHandle {
        self.world.clone()
    }

    /// 获取当前已创建的 actor 数量
    pub fn actor_count(&self) -> usize {
        self.actors().len()
    }

    /// Place a traffic vehicle at an exact position (tests and scripted scenarios)
    pub fn place_vehicle(&self, label: &str, position: Vector3, speed_mps: f64) -> ActorId {
        let actor_id = self.allocate_actor_id();
        self.actors().insert(
            actor_id,
            ActorRecord::Vehicle {
                blueprint: format!("vehicle.scripted.{label}"),
            },
        );
        self.world.lock().add_vehicle(VehicleBody {
            id: actor_id,
            position,
            heading: 0.0,
            speed: speed_mps,
            label: label.to_string(),
            autopilot: true,
        });
        actor_id
    }

    /// Teleport an existing vehicle
    pub fn set_position(&self, actor_id: ActorId, position: Vector3) -> Result<()> {
        let mut world = self.world.lock();
        let body = world
            .vehicles
            .iter_mut()
            .find(|v| v.id == actor_id)
            .ok_or(ActorFactoryError::ActorNotFound { actor_id })?;
        body.position = position;
        Ok(())
    }

    fn actors(&self) -> MutexGuard<'_, HashMap<ActorId, ActorRecord>> {
        self.actors.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn allocate_actor_id(&self) -> ActorId {
        self.next_actor_id.fetch_add(1, Ordering::SeqCst)
    }

    fn ensure_connected(&self) -> Result<()> {
        if self.connected.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(ActorFactoryError::NotConnected)
        }
    }
}

impl Default for MockSimulator {
    fn default() -> Self {
        Self::new()
    }
}

fn camera_config(attributes: &HashMap<String, String>) -> MockCameraConfig {
    let defaults = MockCameraConfig::default();
    let parse_u32 = |key: &str, fallback: u32| {
        attributes
            .get(key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(fallback)
    };
    let frequency_hz = attributes
        .get("sensor_tick")
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|tick| *tick > 0.0)
        .map(|tick| 1.0 / tick)
        .unwrap_or(defaults.frequency_hz);

    MockCameraConfig {
        frequency_hz,
        image_width: parse_u32("image_size_x", defaults.image_width),
        image_height: parse_u32("image_size_y", defaults.image_height),
    }
}

impl SimulatorClient for MockSimulator {
    #[instrument(name = "mock_sim_connect", skip(self), fields(host = %host, port))]
    async fn connect(&mut self, host: &str, port: u16) -> Result<()> {
        if self.config.refuse_connection {
            return Err(ActorFactoryError::ConnectionFailed {
                message: format!("connection to {host}:{port} refused"),
            });
        }
        self.connected.store(true, Ordering::SeqCst);
        info!("connected to mock simulator");
        Ok(())
    }

    #[instrument(name = "mock_sim_world_settings", skip(self))]
    async fn apply_world_settings(
        &self,
        synchronous_mode: bool,
        fixed_delta_seconds: f64,
    ) -> Result<()> {
        self.ensure_connected()?;
        if !synchronous_mode {
            warn!("mock world always steps on tick; asynchronous mode ignored");
        }
        self.world.lock().fixed_delta = fixed_delta_seconds;
        Ok(())
    }

    #[instrument(
        name = "mock_sim_spawn_vehicle",
        skip(self, transform),
        fields(blueprint = %blueprint, has_transform = transform.is_some())
    )]
    async fn spawn_vehicle(&self, blueprint: &str, transform: Option<Transform>) -> Result<ActorId> {
        self.ensure_connected()?;

        if self.config.fail_vehicles.iter().any(|b| b == blueprint) {
            return Err(ActorFactoryError::vehicle_spawn(blueprint, "mock failure"));
        }

        let actor_id = self.allocate_actor_id();
        let position = transform
            .map(|t| Vector3::new(t.location.x, t.location.y, t.location.z))
            .unwrap_or_default();
        let heading = transform
            .map(|t| t.rotation.yaw.to_radians())
            .unwrap_or(0.0);

        self.actors().insert(
            actor_id,
            ActorRecord::Vehicle {
                blueprint: blueprint.to_string(),
            },
        );
        self.world.lock().add_vehicle(VehicleBody {
            id: actor_id,
            position,
            heading,
            speed: 0.0,
            label: blueprint.to_string(),
            autopilot: false,
        });
        Ok(actor_id)
    }

    #[instrument(
        name = "mock_sim_spawn_sensor",
        skip(self, _transform, attributes),
        fields(blueprint = %blueprint, parent_id)
    )]
    async fn spawn_sensor(
        &self,
        blueprint: &str,
        _transform: Transform,
        parent_id: ActorId,
        attributes: &HashMap<String, String>,
    ) -> Result<ActorId> {
        self.ensure_connected()?;

        let role = attributes
            .get(ROLE_NAME_ATTRIBUTE)
            .cloned()
            .unwrap_or_else(|| "unknown".to_string());

        // 验证 parent 存在
        if !self.actors().contains_key(&parent_id) {
            return Err(ActorFactoryError::sensor_spawn(
                role,
                format!("actor_{parent_id}"),
                "parent actor not found",
            ));
        }

        if self.config.fail_sensors.contains(&role) {
            return Err(ActorFactoryError::sensor_spawn(
                role,
                format!("actor_{parent_id}"),
                "mock failure",
            ));
        }

        let actor_id = self.allocate_actor_id();
        self.actors().insert(
            actor_id,
            ActorRecord::Sensor {
                blueprint: blueprint.to_string(),
                parent: parent_id,
                attributes: attributes.clone(),
            },
        );
        Ok(actor_id)
    }

    #[instrument(name = "mock_sim_spawn_traffic", skip(self), fields(count))]
    async fn spawn_traffic(&self, count: usize) -> Result<Vec<ActorId>> {
        self.ensure_connected()?;

        let anchor = {
            let world = self.world.lock();
            world
                .vehicles
                .iter()
                .find(|v| !v.autopilot)
                .map(|v| v.position)
                .unwrap_or_default()
        };

        let mut spawned = Vec::with_capacity(count);
        for _ in 0..count {
            let actor_id = self.allocate_actor_id();
            let body = self.world.lock().traffic_spawn_body(actor_id, anchor);
            match body {
                Some(body) => {
                    self.actors().insert(
                        actor_id,
                        ActorRecord::Vehicle {
                            blueprint: format!("vehicle.traffic.{}", body.label),
                        },
                    );
                    self.world.lock().add_vehicle(body);
                    spawned.push(actor_id);
                }
                None => debug!(actor_id, "spawn point occupied, skipping"),
            }
        }
        Ok(spawned)
    }

    #[instrument(name = "mock_sim_destroy_actor", skip(self), fields(actor_id))]
    async fn destroy_actor(&self, actor_id: ActorId) -> Result<()> {
        if self.config.fail_destroy.contains(&actor_id) {
            return Err(ActorFactoryError::DestroyFailed {
                actor_id,
                message: "mock failure".into(),
            });
        }

        // 幂等：即使不存在也返回 Ok
        if let Some(record) = self.actors().remove(&actor_id) {
            let mut world = self.world.lock();
            match record {
                ActorRecord::Vehicle { .. } => world.remove_vehicle(actor_id),
                ActorRecord::Sensor { .. } => {
                    world.lane_senders.remove(&actor_id);
                }
            }
        }
        Ok(())
    }

    #[instrument(name = "mock_sim_actor_exists", skip(self), fields(actor_id))]
    async fn actor_exists(&self, actor_id: ActorId) -> Result<bool> {
        Ok(self.actors().contains_key(&actor_id))
    }

    async fn apply_control(&self, actor_id: ActorId, control: VehicleControl) -> Result<()> {
        let mut world = self.world.lock();
        if world.vehicle(actor_id).is_none() {
            return Err(ActorFactoryError::ActorNotFound { actor_id });
        }
        world.controls.insert(actor_id, control);
        Ok(())
    }

    async fn tick(&self, ego: ActorId) -> Result<WorldSnapshot> {
        self.ensure_connected()?;

        let next_frame = self.world.frame() + 1;
        if self.config.fail_tick_at == Some(next_frame) {
            return Err(ActorFactoryError::tick(next_frame, "mock failure"));
        }

        self.world
            .step(ego)
            .ok_or(ActorFactoryError::ActorNotFound { actor_id: ego })
    }

    fn sensor_source(
        &self,
        actor_id: ActorId,
        sensor_id: String,
        sensor_type: SensorType,
    ) -> Option<Box<dyn SensorSource>> {
        let record = self.actors().get(&actor_id).cloned()?;
        let ActorRecord::Sensor {
            blueprint,
            parent,
            attributes,
        } = record
        else {
            warn!(actor_id, "actor is not a sensor");
            return None;
        };
        debug!(actor_id, parent, blueprint = %blueprint, "creating sensor source");

        match sensor_type {
            SensorType::Camera(position) => Some(Box::new(MockCamera::new(
                sensor_id,
                position,
                camera_config(&attributes),
                self.world.clone(),
            ))),
            SensorType::LaneInvasion => {
                let (tx, rx) = mpsc::channel();
                self.world.lock().lane_senders.insert(actor_id, tx);
                Some(Box::new(MockLaneSensor::new(sensor_id, rx)))
            }
        }
    }
}

impl MockSimulator {
    /// Position of a camera sensor, if `actor_id` is one.
    pub fn camera_position(&self, actor_id: ActorId) -> Option<CameraPosition> {
        match self.actors().get(&actor_id)? {
            ActorRecord::Sensor { attributes, .. } => attributes
                .get(ROLE_NAME_ATTRIBUTE)
                .and_then(|role| {
                    CameraPosition::ALL
                        .into_iter()
                        .find(|p| role.ends_with(p.as_str()))
                }),
            ActorRecord::Vehicle { .. } => None,
        }
    }
}
