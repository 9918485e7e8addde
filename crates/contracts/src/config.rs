//! AdasConfig - Config Loader 输出
//!
//! 描述完整的会话配置：仿真器、自车、摄像头、检测、告警、主循环、音频、日志输出。
//! 所有段落均可省略，缺省值与演示程序保持一致。

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::{AlertEngineConfig, AudioCue, CameraPosition};

/// 配置版本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// 完整的会话配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdasConfig {
    /// 配置版本
    #[serde(default)]
    pub version: ConfigVersion,

    #[serde(default)]
    pub simulator: SimulatorConfig,

    #[serde(default)]
    pub ego: EgoConfig,

    #[serde(default)]
    pub cameras: CameraConfig,

    #[serde(default)]
    pub detection: DetectionConfig,

    #[serde(default)]
    pub alerts: AlertsConfig,

    #[serde(default, rename = "loop")]
    pub main_loop: LoopConfig,

    #[serde(default)]
    pub audio: AudioConfig,

    /// 输出路由配置
    #[serde(default = "default_sinks")]
    pub sinks: Vec<SinkConfig>,
}

impl Default for AdasConfig {
    fn default() -> Self {
        Self {
            version: ConfigVersion::V1,
            simulator: SimulatorConfig::default(),
            ego: EgoConfig::default(),
            cameras: CameraConfig::default(),
            detection: DetectionConfig::default(),
            alerts: AlertsConfig::default(),
            main_loop: LoopConfig::default(),
            audio: AudioConfig::default(),
            sinks: default_sinks(),
        }
    }
}

/// 仿真器连接与世界设置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatorConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// 连接超时 (秒)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: f64,

    /// 同步模式下的固定步长 (秒)
    #[serde(default = "default_fixed_delta")]
    pub fixed_delta_seconds: f64,

    #[serde(default = "default_true")]
    pub synchronous_mode: bool,

    /// 背景交通车辆数量
    #[serde(default = "default_traffic_vehicles")]
    pub traffic_vehicles: usize,

    /// 随机种子 (交通生成)
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            timeout_secs: default_timeout_secs(),
            fixed_delta_seconds: default_fixed_delta(),
            synchronous_mode: true,
            traffic_vehicles: default_traffic_vehicles(),
            seed: None,
        }
    }
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    2000
}

fn default_timeout_secs() -> f64 {
    10.0
}

fn default_fixed_delta() -> f64 {
    0.05
}

fn default_true() -> bool {
    true
}

fn default_traffic_vehicles() -> usize {
    20
}

/// 自车配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EgoConfig {
    /// 蓝图名称 (e.g., "vehicle.tesla.model3")
    #[serde(default = "default_ego_blueprint")]
    pub blueprint: String,
}

impl Default for EgoConfig {
    fn default() -> Self {
        Self {
            blueprint: default_ego_blueprint(),
        }
    }
}

fn default_ego_blueprint() -> String {
    "vehicle.tesla.model3".to_string()
}

/// 3D 变换：位置 + 旋转
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// 位置 (x, y, z) 单位：米
    pub location: Location,

    /// 旋转 (pitch, yaw, roll) 单位：度
    pub rotation: Rotation,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rotation {
    pub pitch: f64,
    pub yaw: f64,
    pub roll: f64,
}

/// 四路摄像头共用的参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraConfig {
    #[serde(default = "default_camera_width")]
    pub width: u32,

    #[serde(default = "default_camera_height")]
    pub height: u32,

    /// 水平视场角 (度)
    #[serde(default = "default_camera_fov")]
    pub fov: f64,

    /// 采样频率 (Hz)，必须 > 0
    #[serde(default = "default_camera_frequency")]
    pub frequency_hz: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            width: default_camera_width(),
            height: default_camera_height(),
            fov: default_camera_fov(),
            frequency_hz: default_camera_frequency(),
        }
    }
}

impl CameraConfig {
    /// Mount pose relative to the ego vehicle.
    pub fn mount(position: CameraPosition) -> Transform {
        let (x, y, yaw) = match position {
            CameraPosition::Left => (-1.0, -1.2, -90.0),
            CameraPosition::Right => (-1.0, 1.2, 90.0),
            CameraPosition::Front => (1.5, 0.0, 0.0),
            CameraPosition::Rear => (-1.5, 0.0, 180.0),
        };
        Transform {
            location: Location { x, y, z: 1.6 },
            rotation: Rotation {
                pitch: 0.0,
                yaw,
                roll: 0.0,
            },
        }
    }
}

fn default_camera_width() -> u32 {
    320
}

fn default_camera_height() -> u32 {
    240
}

fn default_camera_fov() -> f64 {
    100.0
}

fn default_camera_frequency() -> f64 {
    20.0
}

/// 盲区检测参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// 每 N 个 tick 运行一次检测
    #[serde(default = "default_skip_frames")]
    pub skip_frames: u32,

    /// 推理前的缩放比例
    #[serde(default = "default_downscale_factor")]
    pub downscale_factor: f32,

    /// 推理尺寸 (最长边像素)
    #[serde(default = "default_inference_size")]
    pub inference_size: u32,

    /// 车辆类别关键字 (小写子串匹配)
    #[serde(default = "default_vehicle_keywords")]
    pub vehicle_keywords: Vec<String>,

    /// 置信度下限
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            skip_frames: default_skip_frames(),
            downscale_factor: default_downscale_factor(),
            inference_size: default_inference_size(),
            vehicle_keywords: default_vehicle_keywords(),
            confidence_threshold: default_confidence_threshold(),
        }
    }
}

pub(crate) fn default_skip_frames() -> u32 {
    3
}

pub(crate) fn default_downscale_factor() -> f32 {
    0.5
}

pub(crate) fn default_inference_size() -> u32 {
    160
}

pub(crate) fn default_vehicle_keywords() -> Vec<String> {
    ["car", "truck", "bus"].iter().map(|s| s.to_string()).collect()
}

pub(crate) fn default_confidence_threshold() -> f32 {
    0.30
}

/// 告警去抖参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertsConfig {
    /// 最后一次非 clear 信号之后，保持告警的最短时间 (秒)
    #[serde(default = "default_warning_clear_time")]
    pub warning_clear_time: f64,
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            warning_clear_time: default_warning_clear_time(),
        }
    }
}

pub(crate) fn default_warning_clear_time() -> f64 {
    0.5
}

/// 主循环节奏
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoopConfig {
    #[serde(default = "default_target_fps")]
    pub target_fps: u32,

    /// 运行指定 tick 数后退出 (None = 直到退出信号)
    #[serde(default)]
    pub max_ticks: Option<u64>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            target_fps: default_target_fps(),
            max_ticks: None,
        }
    }
}

fn default_target_fps() -> u32 {
    30
}

/// 音频提示文件
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_assets_dir")]
    pub assets_dir: PathBuf,

    #[serde(default = "default_blindspot_file")]
    pub blindspot_file: String,

    #[serde(default = "default_proximity_file")]
    pub proximity_file: String,

    #[serde(default = "default_lane_file")]
    pub lane_file: String,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            assets_dir: default_assets_dir(),
            blindspot_file: default_blindspot_file(),
            proximity_file: default_proximity_file(),
            lane_file: default_lane_file(),
        }
    }
}

impl AudioConfig {
    /// Configured file path for `cue`.
    pub fn cue_path(&self, cue: AudioCue) -> PathBuf {
        let file = match cue {
            AudioCue::Blindspot => &self.blindspot_file,
            AudioCue::Proximity => &self.proximity_file,
            AudioCue::Lane => &self.lane_file,
        };
        self.assets_dir.join(file)
    }
}

fn default_assets_dir() -> PathBuf {
    PathBuf::from("assets")
}

fn default_blindspot_file() -> String {
    "blindspot_warning.wav".to_string()
}

fn default_proximity_file() -> String {
    "proximity_warning.wav".to_string()
}

fn default_lane_file() -> String {
    "lane_warning.wav".to_string()
}

/// Sink 输出配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Sink 名称
    pub name: String,

    /// Sink 类型
    pub sink_type: SinkType,

    /// 队列容量
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// 类型特定参数
    #[serde(default)]
    pub params: HashMap<String, String>,
}

fn default_queue_capacity() -> usize {
    100
}

fn default_sinks() -> Vec<SinkConfig> {
    vec![SinkConfig {
        name: "detections".to_string(),
        sink_type: SinkType::Csv,
        queue_capacity: default_queue_capacity(),
        params: HashMap::from([("dir".to_string(), "logs".to_string())]),
    }]
}

/// Sink 类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    /// 日志输出
    Log,
    /// CSV 文件输出
    Csv,
}

impl AdasConfig {
    /// Build the alert engine parameters from the detection and alert sections.
    ///
    /// `available_cues` is the subset of cues that can actually be played.
    pub fn to_alert_engine_config(&self, available_cues: &[AudioCue]) -> AlertEngineConfig {
        let mut enabled_cues: Vec<AudioCue> = if self.audio.enabled {
            available_cues.to_vec()
        } else {
            Vec::new()
        };
        enabled_cues.sort();
        enabled_cues.dedup();

        AlertEngineConfig {
            skip_frames: self.detection.skip_frames.max(1),
            warning_clear_time: self.alerts.warning_clear_time,
            downscale_factor: self.detection.downscale_factor,
            inference_size: self.detection.inference_size,
            vehicle_keywords: self
                .detection
                .vehicle_keywords
                .iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
            confidence_threshold: self.detection.confidence_threshold,
            enabled_cues,
        }
    }

    /// Tick period derived from `loop.target_fps`.
    pub fn tick_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(1.0 / f64::from(self.main_loop.target_fps.max(1)))
    }
}
