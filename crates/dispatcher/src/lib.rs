//! # Dispatcher
//!
//! 观测日志分发模块。
//!
//! 负责：
//! - 消费 `ObservationRecord`
//! - Fan-out 到多个 sinks（log / csv）
//! - 隔离慢 sink，不阻塞主循环
//! - 音频提示输出与提示音生成

pub mod audio;
pub mod dispatcher;
pub mod error;
pub mod handle;
pub mod metrics;
pub mod sinks;
pub mod tones;

pub use audio::{CueRegistry, LoggingAudioSink};
pub use contracts::{ObservationRecord, RecordSink};
pub use dispatcher::{
    Dispatcher, DispatcherBuilder, DispatcherConfig, DispatcherHandle, create_dispatcher,
    start_dispatcher,
};
pub use error::DispatcherError;
pub use handle::SinkHandle;
pub use metrics::{MetricsSnapshot, SinkMetrics};
pub use sinks::{CsvSink, LogSink};
pub use tones::{GeneratedAssets, TonePattern, generate_cue_assets};
