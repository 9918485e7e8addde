//! Telemetry - 仿真世界状态与车辆控制
//!
//! 每个仿真 tick 轮询一次的自车与周围车辆状态。

use serde::{Deserialize, Serialize};

use crate::ActorId;

/// 3D 向量
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// 单个车辆的运动学状态
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentState {
    /// Actor 句柄
    pub id: ActorId,

    /// 位置 (米)
    pub position: Vector3,

    /// 速度 (m/s)
    pub velocity: Vector3,
}

impl AgentState {
    /// Scalar speed in m/s.
    pub fn speed(&self) -> f64 {
        self.velocity.length()
    }
}

/// 一次仿真 tick 的世界快照
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// 仿真帧号
    pub frame: u64,

    /// 仿真时间 (秒) - 去抖时钟
    pub timestamp: f64,

    /// 自车状态
    pub ego: AgentState,

    /// 其他车辆 (可能包含自车，由消费者过滤)
    pub agents: Vec<AgentState>,
}

/// 施加到自车的控制量
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VehicleControl {
    /// 0..=1
    pub throttle: f32,
    /// 0..=1
    pub brake: f32,
    /// -1..=1
    pub steer: f32,
    pub reverse: bool,
}

/// 从输入设备解码出的驾驶意图
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlIntent {
    pub throttle: f32,
    pub brake: f32,
    pub steer: f32,
    /// Rising edge of the reverse key
    pub reverse_toggle: bool,
    pub quit: bool,
}

impl VehicleControl {
    /// Apply an intent on top of the previous control state.
    ///
    /// Reverse is latched and flips on each toggle.
    pub fn apply(&self, intent: &ControlIntent) -> VehicleControl {
        VehicleControl {
            throttle: intent.throttle.clamp(0.0, 1.0),
            brake: intent.brake.clamp(0.0, 1.0),
            steer: intent.steer.clamp(-1.0, 1.0),
            reverse: if intent.reverse_toggle {
                !self.reverse
            } else {
                self.reverse
            },
        }
    }
}
