//! 告警等级与通道定义
//!
//! 所有告警通道共享三级严重度：Clear < Near < Warn。
//! 车道通道只使用 Clear (未压线) 与 Warn (压线)。

use serde::{Deserialize, Serialize};
use std::fmt;

/// 三级告警严重度
///
/// 排序与严重度一致，`max()` 即可取最高级别。
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum AlertLevel {
    #[default]
    Clear,
    Near,
    Warn,
}

impl AlertLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertLevel::Clear => "clear",
            AlertLevel::Near => "near",
            AlertLevel::Warn => "warn",
        }
    }

    pub fn is_clear(&self) -> bool {
        matches!(self, AlertLevel::Clear)
    }
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 独立监控的告警通道
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    LeftBlindSpot,
    RightBlindSpot,
    Proximity,
    Lane,
}

impl Channel {
    pub const ALL: [Channel; 4] = [
        Channel::LeftBlindSpot,
        Channel::RightBlindSpot,
        Channel::Proximity,
        Channel::Lane,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::LeftBlindSpot => "left_blind_spot",
            Channel::RightBlindSpot => "right_blind_spot",
            Channel::Proximity => "proximity",
            Channel::Lane => "lane",
        }
    }

    /// Audio cue played on this channel's rising edge into Warn.
    pub fn cue(&self) -> AudioCue {
        match self {
            Channel::LeftBlindSpot | Channel::RightBlindSpot => AudioCue::Blindspot,
            Channel::Proximity => AudioCue::Proximity,
            Channel::Lane => AudioCue::Lane,
        }
    }

    /// Blind-spot side, if this is a camera-driven channel.
    pub fn side(&self) -> Option<Side> {
        match self {
            Channel::LeftBlindSpot => Some(Side::Left),
            Channel::RightBlindSpot => Some(Side::Right),
            _ => None,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 音频提示类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioCue {
    Blindspot,
    Proximity,
    Lane,
}

impl AudioCue {
    pub const ALL: [AudioCue; 3] = [AudioCue::Blindspot, AudioCue::Proximity, AudioCue::Lane];

    pub fn as_str(&self) -> &'static str {
        match self {
            AudioCue::Blindspot => "blindspot",
            AudioCue::Proximity => "proximity",
            AudioCue::Lane => "lane",
        }
    }
}

impl fmt::Display for AudioCue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 盲区侧别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }

    pub fn channel(&self) -> Channel {
        match self {
            Side::Left => Channel::LeftBlindSpot,
            Side::Right => Channel::RightBlindSpot,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stabilized per-channel levels plus the fused overall severity for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertSnapshot {
    pub left: AlertLevel,
    pub right: AlertLevel,
    pub proximity: AlertLevel,
    pub lane: AlertLevel,
    pub overall: AlertLevel,
}

impl AlertSnapshot {
    pub fn lane_active(&self) -> bool {
        !self.lane.is_clear()
    }

    pub fn level(&self, channel: Channel) -> AlertLevel {
        match channel {
            Channel::LeftBlindSpot => self.left,
            Channel::RightBlindSpot => self.right,
            Channel::Proximity => self.proximity,
            Channel::Lane => self.lane,
        }
    }
}
