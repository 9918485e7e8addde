//! ActorFactory 核心实现
//!
//! 根据 AdasConfig spawn 自车、四路摄像头、压线传感器与背景交通，管理生命周期。

use std::collections::HashMap;

use contracts::{
    ActorId, AdasConfig, CameraConfig, CameraPosition, RuntimeGraph, SensorType, Transform,
};
use tracing::{error, info, instrument, warn};

use crate::client::SimulatorClient;
use crate::error::{ActorFactoryError, Result};
use crate::mock_client::ROLE_NAME_ATTRIBUTE;

/// Config ID of the ego vehicle
pub const EGO_ID: &str = "ego";
/// Sensor ID of the lane invasion sensor
pub const LANE_SENSOR_ID: &str = "lane_invasion";

/// Sensor ID of the camera at `position`
pub fn camera_sensor_id(position: CameraPosition) -> String {
    format!("camera_{}", position.as_str())
}

/// Sensor spawn request
struct SensorRequest {
    sensor_id: String,
    sensor_type: SensorType,
    blueprint: &'static str,
    transform: Transform,
    attributes: HashMap<String, String>,
}

/// Outcome of a best-effort teardown
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeardownReport {
    pub destroyed: usize,
    pub failed: Vec<ActorId>,
}

impl TeardownReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Actor Factory
///
/// 负责 spawn 自车及其传感器，并提供 teardown 和回滚能力。
pub struct ActorFactory<C: SimulatorClient> {
    client: C,
}

impl<C: SimulatorClient> ActorFactory<C> {
    /// 创建新的 ActorFactory
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// Access the underlying client (control, tick, sensor sources)
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Spawn 自车、传感器和背景交通
    ///
    /// # 原子性保证
    /// 自车或任一传感器 spawn 失败时，回滚销毁所有已创建的 actors。
    /// 背景交通是尽力而为：失败只记录日志。
    #[instrument(
        name = "actor_factory_spawn_rig",
        skip(self, config),
        fields(traffic = config.simulator.traffic_vehicles)
    )]
    pub async fn spawn_rig(&self, config: &AdasConfig) -> Result<RuntimeGraph> {
        let mut graph = RuntimeGraph::new();

        let ego = self.spawn_ego(config).await?;
        graph.register_ego(ego);

        let mut created_sensors: Vec<(String, ActorId)> = Vec::new();
        for request in sensor_requests(config) {
            match self.spawn_sensor_actor(ego, &request).await {
                Ok(actor_id) => {
                    graph.register_sensor(request.sensor_id.clone(), actor_id, request.sensor_type);
                    created_sensors.push((request.sensor_id, actor_id));
                }
                Err(e) => {
                    // 回滚该 vehicle 的所有 sensors
                    warn!(
                        sensor_id = %request.sensor_id,
                        error = %e,
                        "sensor spawn failed, rolling back rig"
                    );
                    self.rollback(&created_sensors, ego).await;
                    return Err(e);
                }
            }
        }

        let wanted = config.simulator.traffic_vehicles;
        if wanted > 0 {
            match self.client.spawn_traffic(wanted).await {
                Ok(traffic) => {
                    if traffic.len() < wanted {
                        warn!(wanted, spawned = traffic.len(), "some traffic spawns were skipped");
                    }
                    graph.register_traffic(traffic);
                }
                Err(e) => warn!(error = %e, "traffic spawn failed, continuing without traffic"),
            }
        }

        info!(
            ego,
            sensors = graph.sensors.len(),
            traffic = graph.traffic.len(),
            "spawn_rig completed successfully"
        );

        Ok(graph)
    }

    /// 销毁 RuntimeGraph 中的所有 actors
    ///
    /// 顺序：sensors → traffic → ego。单个失败只记录日志，不中断后续步骤。
    /// 多次调用安全，不存在的 actor 会被忽略。
    #[instrument(
        name = "actor_factory_teardown",
        skip(self, graph),
        fields(sensor_count = graph.sensors.len(), traffic_count = graph.traffic.len())
    )]
    pub async fn teardown(&self, graph: &RuntimeGraph) -> TeardownReport {
        info!("starting teardown");

        let mut report = TeardownReport::default();
        for actor_id in graph.all_actor_ids() {
            if self.destroy_actor_safe(actor_id).await {
                report.destroyed += 1;
            } else {
                report.failed.push(actor_id);
            }
        }

        if report.is_clean() {
            info!(destroyed = report.destroyed, "teardown completed");
        } else {
            warn!(
                destroyed = report.destroyed,
                failed = report.failed.len(),
                "teardown completed with failures"
            );
        }
        report
    }

    /// 回滚：销毁所有已创建的 actors
    #[instrument(
        name = "actor_factory_rollback",
        skip(self, sensors),
        fields(sensor_count = sensors.len())
    )]
    async fn rollback(&self, sensors: &[(String, ActorId)], ego: ActorId) {
        warn!("performing rollback");

        for (_, actor_id) in sensors {
            self.destroy_actor_safe(*actor_id).await;
        }
        self.destroy_actor_safe(ego).await;
    }

    /// 安全销毁 actor（忽略错误，仅记录日志）
    async fn destroy_actor_safe(&self, actor_id: ActorId) -> bool {
        info!(actor_id, "destroying actor");

        match self.client.destroy_actor(actor_id).await {
            Ok(()) => true,
            Err(e) => {
                error!(actor_id, error = %e, "failed to destroy actor");
                false
            }
        }
    }

    #[instrument(name = "actor_factory_spawn_ego", skip(self, config))]
    async fn spawn_ego(&self, config: &AdasConfig) -> Result<ActorId> {
        info!(blueprint = %config.ego.blueprint, "spawning ego vehicle");
        let actor_id = self
            .client
            .spawn_vehicle(&config.ego.blueprint, None)
            .await
            .map_err(|e| ActorFactoryError::vehicle_spawn(EGO_ID, e.to_string()))?;

        info!(actor_id, "ego vehicle spawned successfully");
        Ok(actor_id)
    }

    #[instrument(
        name = "actor_factory_spawn_sensor_actor",
        skip(self, request),
        fields(sensor_id = %request.sensor_id)
    )]
    async fn spawn_sensor_actor(&self, ego: ActorId, request: &SensorRequest) -> Result<ActorId> {
        self.client
            .spawn_sensor(request.blueprint, request.transform, ego, &request.attributes)
            .await
            .map_err(|e| ActorFactoryError::sensor_spawn(&request.sensor_id, EGO_ID, e.to_string()))
            .inspect(|&actor_id| {
                info!(actor_id, "sensor spawned and attached successfully");
            })
    }
}

/// Four cameras (left, right, front, rear) followed by the lane invasion sensor.
fn sensor_requests(config: &AdasConfig) -> Vec<SensorRequest> {
    let cams = &config.cameras;
    let mut requests: Vec<SensorRequest> = CameraPosition::ALL
        .into_iter()
        .map(|position| {
            let sensor_id = camera_sensor_id(position);
            let attributes = HashMap::from([
                (ROLE_NAME_ATTRIBUTE.to_string(), sensor_id.clone()),
                ("image_size_x".to_string(), cams.width.to_string()),
                ("image_size_y".to_string(), cams.height.to_string()),
                ("fov".to_string(), cams.fov.to_string()),
                ("sensor_tick".to_string(), (1.0 / cams.frequency_hz).to_string()),
            ]);
            SensorRequest {
                sensor_id,
                sensor_type: SensorType::Camera(position),
                blueprint: "sensor.camera.rgb",
                transform: CameraConfig::mount(position),
                attributes,
            }
        })
        .collect();

    requests.push(SensorRequest {
        sensor_id: LANE_SENSOR_ID.to_string(),
        sensor_type: SensorType::LaneInvasion,
        blueprint: "sensor.other.lane_invasion",
        transform: CameraConfig::mount(CameraPosition::Front),
        attributes: HashMap::from([(
            ROLE_NAME_ATTRIBUTE.to_string(),
            LANE_SENSOR_ID.to_string(),
        )]),
    });
    requests
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_client::{MockConfig, MockSimulator};

    fn test_config(traffic: usize) -> AdasConfig {
        let mut config = AdasConfig::default();
        config.simulator.traffic_vehicles = traffic;
        config.simulator.seed = Some(1);
        config
    }

    async fn factory(config: MockConfig) -> ActorFactory<MockSimulator> {
        let mut client = MockSimulator::with_config(config);
        client.connect("localhost", 2000).await.unwrap();
        ActorFactory::new(client)
    }

    #[tokio::test]
    async fn test_spawn_success() {
        let factory = factory(MockConfig::default()).await;
        let graph = factory.spawn_rig(&test_config(5)).await.unwrap();

        assert!(graph.ego.is_some());
        assert_eq!(graph.sensors.len(), 5);
        assert!(graph.sensors.contains_key("camera_left"));
        assert!(graph.sensors.contains_key("camera_rear"));
        assert_eq!(
            graph.sensors[LANE_SENSOR_ID].sensor_type,
            SensorType::LaneInvasion
        );
        assert!(!graph.traffic.is_empty());
    }

    #[tokio::test]
    async fn test_sensor_spawn_failure_rollback() {
        let factory = factory(MockConfig {
            fail_sensors: vec![LANE_SENSOR_ID.to_string()],
            ..Default::default()
        })
        .await;

        let result = factory.spawn_rig(&test_config(3)).await;

        assert!(matches!(
            result,
            Err(ActorFactoryError::SensorSpawnFailed { .. })
        ));
        // Ego and the four cameras were rolled back, traffic never spawned
        assert_eq!(factory.client().actor_count(), 0);
    }

    #[tokio::test]
    async fn test_ego_spawn_failure() {
        let factory = factory(MockConfig {
            fail_vehicles: vec!["vehicle.tesla.model3".to_string()],
            ..Default::default()
        })
        .await;

        let result = factory.spawn_rig(&test_config(0)).await;
        assert!(matches!(
            result,
            Err(ActorFactoryError::VehicleSpawnFailed { .. })
        ));
        assert_eq!(factory.client().actor_count(), 0);
    }

    #[tokio::test]
    async fn test_teardown_idempotent() {
        let factory = factory(MockConfig::default()).await;
        let graph = factory.spawn_rig(&test_config(4)).await.unwrap();

        let first = factory.teardown(&graph).await;
        assert!(first.is_clean());
        assert_eq!(factory.client().actor_count(), 0);

        // Second teardown should also succeed
        let second = factory.teardown(&graph).await;
        assert!(second.is_clean());
    }

    #[tokio::test]
    async fn test_teardown_continues_after_failure() {
        // Actor ids are allocated from 1000: ego first, then the first camera
        let factory = factory(MockConfig {
            fail_destroy: vec![1001],
            ..Default::default()
        })
        .await;
        let graph = factory.spawn_rig(&test_config(0)).await.unwrap();

        let report = factory.teardown(&graph).await;
        assert_eq!(report.failed, vec![1001]);
        assert_eq!(report.destroyed, 5);
        assert_eq!(factory.client().actor_count(), 1);
    }

    #[test]
    fn test_sensor_requests() {
        let requests = sensor_requests(&AdasConfig::default());
        assert_eq!(requests.len(), 5);
        assert_eq!(requests[0].sensor_id, "camera_left");
        assert_eq!(requests[0].attributes["image_size_x"], "320");
        assert_eq!(requests[4].blueprint, "sensor.other.lane_invasion");
    }
}
