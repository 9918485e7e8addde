//! SensorPacket - 传感器回调输出
//!
//! 原始传感器数据包结构。

use serde::{Deserialize, Serialize};

use crate::{CameraPosition, ImageFrame};

/// 传感器数据包
///
/// 从传感器回调线程接收的数据。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorPacket {
    /// 传感器 ID
    pub sensor_id: String,

    /// 传感器类型
    pub sensor_type: SensorType,

    /// 仿真时间戳 (seconds, f64) - 主时钟
    pub timestamp: f64,

    /// 可选的帧序号 (用于排序/诊断)
    pub frame_id: Option<u64>,

    /// 数据载荷
    pub payload: SensorPayload,
}

/// 传感器数据载荷
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SensorPayload {
    /// 摄像头图像
    Image(ImageFrame),

    /// 压线事件
    LaneInvasion(LaneEvent),
}

/// 传感器类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorType {
    Camera(CameraPosition),
    LaneInvasion,
}

impl SensorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorType::Camera(_) => "camera",
            SensorType::LaneInvasion => "lane_invasion",
        }
    }
}

/// 车道线越界事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaneEvent {
    /// 仿真时间戳 (秒)
    pub timestamp: f64,

    /// 触发帧号
    pub frame_id: u64,

    /// 被越过的车道线类型 (e.g. "Broken", "Solid")
    pub crossed_markings: Vec<String>,
}
