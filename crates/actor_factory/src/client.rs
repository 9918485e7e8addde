//! Simulator client abstraction
//!
//! Defines the operations the dashboard needs from a vehicle simulator,
//! so a real backend and the mock world share one interface.

use std::collections::HashMap;
use std::future::Future;

use contracts::{ActorId, SensorSource, SensorType, Transform, VehicleControl, WorldSnapshot};

use crate::error::Result;

/// Simulator client trait
pub trait SimulatorClient: Send + Sync {
    /// Connect to simulator server
    fn connect(&mut self, host: &str, port: u16) -> impl Future<Output = Result<()>> + Send;

    /// Switch the world to (a)synchronous stepping
    ///
    /// In synchronous mode the world only advances on `tick`, by `fixed_delta_seconds`.
    fn apply_world_settings(
        &self,
        synchronous_mode: bool,
        fixed_delta_seconds: f64,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Spawn vehicle
    ///
    /// # Arguments
    /// * `blueprint` - Blueprint name, e.g., "vehicle.tesla.model3"
    /// * `transform` - Initial pose, `None` picks a spawn point
    ///
    /// # Returns
    /// Newly created actor ID
    fn spawn_vehicle(
        &self,
        blueprint: &str,
        transform: Option<Transform>,
    ) -> impl Future<Output = Result<ActorId>> + Send;

    /// Spawn sensor and attach to parent actor
    ///
    /// # Arguments
    /// * `blueprint` - Blueprint name, e.g., "sensor.camera.rgb"
    /// * `transform` - Pose relative to parent actor
    /// * `parent_id` - Parent actor ID
    /// * `attributes` - Sensor attributes (`role_name`, `image_size_x`, ...)
    fn spawn_sensor(
        &self,
        blueprint: &str,
        transform: Transform,
        parent_id: ActorId,
        attributes: &HashMap<String, String>,
    ) -> impl Future<Output = Result<ActorId>> + Send;

    /// Spawn autopilot background traffic
    ///
    /// Individual spawn collisions are skipped, so fewer than `count` actors may be returned.
    fn spawn_traffic(&self, count: usize) -> impl Future<Output = Result<Vec<ActorId>>> + Send;

    /// Destroy actor
    ///
    /// Idempotent operation: returns Ok if actor doesn't exist
    fn destroy_actor(&self, actor_id: ActorId) -> impl Future<Output = Result<()>> + Send;

    /// Check if actor exists
    fn actor_exists(&self, actor_id: ActorId) -> impl Future<Output = Result<bool>> + Send;

    /// Apply driver control to a vehicle
    fn apply_control(
        &self,
        actor_id: ActorId,
        control: VehicleControl,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Advance the world one step and poll telemetry for `ego`
    fn tick(&self, ego: ActorId) -> impl Future<Output = Result<WorldSnapshot>> + Send;

    /// Get sensor data source
    ///
    /// Returns `None` if the actor doesn't exist.
    fn sensor_source(
        &self,
        actor_id: ActorId,
        sensor_id: String,
        sensor_type: SensorType,
    ) -> Option<Box<dyn SensorSource>>;
}
