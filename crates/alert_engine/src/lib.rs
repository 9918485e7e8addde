//! # Alert Engine
//!
//! 告警状态聚合引擎。
//!
//! 负责：
//! - 按节奏调度盲区检测 (每 N 个 tick)
//! - 检测适配：缩放、车辆类别过滤、占用区间判级
//! - 最近车辆距离监控
//! - 每通道去抖/迟滞，Clear → Warn 上升沿触发音频
//! - 四通道融合为整体告警等级
//!
//! ## 使用示例
//!
//! ```ignore
//! use alert_engine::{AlertEngine, TickInput};
//!
//! let mut engine = AlertEngine::new(config.to_alert_engine_config(&cues), classifier);
//!
//! // Once per simulation tick
//! let outcome = engine.tick(
//!     TickInput { now: snapshot.timestamp, ego: &snapshot.ego, agents: &snapshot.agents, lane_events: &events },
//!     frames.as_ref(),
//! );
//! for cue in &outcome.audio_cues {
//!     audio.play(*cue);
//! }
//! ```

mod aggregator;
mod debouncer;
mod detection;
mod engine;
mod proximity;
mod scheduler;

// Re-exports
pub use aggregator::{aggregate, collect_cues};
pub use contracts::{AlertEngineConfig, AlertLevel, AlertSnapshot, AudioCue, Channel};
pub use debouncer::{ChannelDebouncer, ChannelState, ChannelUpdate};
pub use detection::{
    downscale, is_vehicle_label, zone_level, DetectionAdapter, DetectionResult, NullClassifier,
    ZonedDetection,
};
pub use engine::{AlertEngine, TickInput, TickOutcome};
pub use proximity::{
    proximity_level, scan, NearestAgent, ProximityObservation, NEAR_DISTANCE_M, WARN_DISTANCE_M,
};
pub use scheduler::{camera_for, FrameScheduler};
