//! # Contracts
//!
//! Frozen interface contracts, defining inter-module data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Uses simulation timestamp (seconds, f64) as primary clock, also for alert hysteresis
//! - `frame_id` is optional, used for ordering/diagnostics

mod alert;
mod alert_engine_config;
mod config;
mod dashboard;
mod detection;
mod error;
mod frame;
mod record;
mod runtime;
mod sensor;
mod sensor_source;
mod sink;
mod telemetry;

pub use alert::*;
pub use alert_engine_config::*;
pub use config::*;
pub use dashboard::*;
pub use detection::*;
pub use error::*;
pub use frame::*;
pub use record::*;
pub use runtime::*;
pub use sensor::*;
pub use sensor_source::{SensorDataCallback, SensorSource};
pub use sink::*;
pub use telemetry::*;
