//! ImageFrame - 摄像头解码帧
//!
//! 摄像头回调写入、帧调度器读取的最新帧。

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// 摄像头安装位置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraPosition {
    Left,
    Right,
    Front,
    Rear,
}

impl CameraPosition {
    pub const ALL: [CameraPosition; 4] = [
        CameraPosition::Left,
        CameraPosition::Right,
        CameraPosition::Front,
        CameraPosition::Rear,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CameraPosition::Left => "left",
            CameraPosition::Right => "right",
            CameraPosition::Front => "front",
            CameraPosition::Rear => "rear",
        }
    }

    /// Dense index, used for fixed-size per-camera tables.
    pub fn index(&self) -> usize {
        match self {
            CameraPosition::Left => 0,
            CameraPosition::Right => 1,
            CameraPosition::Front => 2,
            CameraPosition::Rear => 3,
        }
    }
}

impl fmt::Display for CameraPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 像素格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelFormat {
    Rgb8,
    Rgba8,
    Bgra8,
}

impl PixelFormat {
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelFormat::Rgb8 => 3,
            PixelFormat::Rgba8 | PixelFormat::Bgra8 => 4,
        }
    }
}

/// 解码后的摄像头帧
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageFrame {
    /// 产生该帧的摄像头
    pub camera: CameraPosition,

    /// 图像宽度
    pub width: u32,

    /// 图像高度
    pub height: u32,

    /// 像素格式
    pub format: PixelFormat,

    /// 仿真时间戳 (秒)
    pub timestamp: f64,

    /// 可选的帧序号
    pub frame_id: Option<u64>,

    /// 原始像素数据 (零拷贝)
    pub data: Bytes,
}

impl ImageFrame {
    /// Expected payload length for the declared geometry.
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * self.format.bytes_per_pixel()
    }

    pub fn is_well_formed(&self) -> bool {
        self.width > 0 && self.height > 0 && self.data.len() == self.expected_len()
    }
}

/// Read side of the per-camera latest-frame buffers.
///
/// Producers overwrite, consumers only ever observe the newest frame.
pub trait FrameStore: Send + Sync {
    /// Latest frame for `camera`, or `None` if nothing has arrived yet.
    fn latest(&self, camera: CameraPosition) -> Option<Arc<ImageFrame>>;
}
