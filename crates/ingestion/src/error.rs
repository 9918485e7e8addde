//! Ingestion 错误类型

use thiserror::Error;

/// Ingestion 错误
#[derive(Debug, Error)]
pub enum IngestionError {
    /// 同一 sensor ID 重复注册
    #[error("sensor {sensor_id} is already registered")]
    DuplicateSensor {
        /// 传感器 ID
        sensor_id: String,
    },

    /// 图像帧尺寸与数据长度不符
    #[error("malformed frame from sensor {sensor_id}: {message}")]
    MalformedFrame {
        /// 传感器 ID
        sensor_id: String,
        /// 错误消息
        message: String,
    },

    /// 载荷与注册的传感器类型不一致
    #[error("sensor {sensor_id} registered as {expected} delivered {actual}")]
    PayloadMismatch {
        /// 传感器 ID
        sensor_id: String,
        expected: String,
        actual: String,
    },
}

/// Ingestion Result 类型别名
pub type Result<T> = std::result::Result<T, IngestionError>;
