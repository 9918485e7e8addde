//! # Actor Factory
//!
//! 仿真资产工厂模块。
//!
//! Responsibilities:
//! - Spawn the ego vehicle, its four cameras and the lane invasion sensor from `AdasConfig`
//! - Spawn background traffic
//! - Manage actor lifecycle, with rollback and best-effort teardown
//! - Provide unified `SensorSource` abstraction
//! - Provide an in-process mock world with a ground-truth classifier

pub mod client;
pub mod error;
pub mod factory;
pub mod ground_truth;
pub mod mock_client;
pub mod mock_sensor;
pub mod world;

pub use client::SimulatorClient;
pub use contracts::{ActorId, RuntimeGraph, SensorSource};
pub use error::{ActorFactoryError, Result};
pub use factory::{camera_sensor_id, ActorFactory, TeardownReport, EGO_ID, LANE_SENSOR_ID};
pub use ground_truth::GroundTruthClassifier;
pub use mock_client::{MockConfig, MockSimulator};
pub use mock_sensor::{MockCamera, MockCameraConfig, MockLaneSensor};
pub use world::{WorldHandle, LANE_WIDTH_M};
