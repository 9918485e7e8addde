//! # Ingestion Pipeline
//!
//! Sensor data ingestion module.
//!
//! Responsibilities:
//! - Register sensor data sources (mock or simulator-backed)
//! - Keep the latest frame of each camera in a single-slot buffer
//! - Latch lane invasion events until the main loop drains them
//! - Start/stop every subscription exactly once
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::IngestionPipeline;
//!
//! let mut pipeline = IngestionPipeline::new();
//! let source = client.sensor_source(actor_id, sensor_id.clone(), sensor_type)?;
//! pipeline.register_sensor_source(sensor_id, source)?;
//! pipeline.start_all();
//!
//! let frames = pipeline.frames();          // impl FrameStore
//! let events = pipeline.drain_lane_events();
//! pipeline.stop_all();
//! ```

mod adapter;
mod error;
mod frame_buffer;
mod lane_latch;
mod metrics;
mod pipeline;
mod router;

// Re-exports
pub use adapter::SourceAdapter;
pub use contracts::SensorPacket;
pub use error::{IngestionError, Result};
pub use frame_buffer::{FrameBuffers, FrameSlot};
pub use lane_latch::LaneEventLatch;
pub use metrics::{IngestionMetrics, MetricsSnapshot};
pub use pipeline::IngestionPipeline;
pub use router::PacketRouter;
