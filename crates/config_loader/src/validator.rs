//! 配置校验模块
//!
//! 校验规则：
//! - 检测节流 skip_frames >= 1，推理尺寸 > 0，缩放比例在 (0, 1]
//! - 车辆关键字非空
//! - 置信度阈值在 [0, 1]
//! - 去抖时间 >= 0，目标帧率 > 0
//! - 摄像头尺寸、频率、视场角合法
//! - 仿真步长 > 0
//! - sink 名称非空且唯一，队列容量 > 0

use std::collections::HashSet;

use contracts::{AdasConfig, ContractError};

/// 校验 AdasConfig 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(config: &AdasConfig) -> Result<(), ContractError> {
    validate_simulator(config)?;
    validate_cameras(config)?;
    validate_detection(config)?;
    validate_timing(config)?;
    validate_sinks(config)?;
    Ok(())
}

fn validate_simulator(config: &AdasConfig) -> Result<(), ContractError> {
    let sim = &config.simulator;
    if sim.fixed_delta_seconds <= 0.0 {
        return Err(ContractError::config_validation(
            "simulator.fixed_delta_seconds",
            format!(
                "fixed_delta_seconds must be > 0, got {}",
                sim.fixed_delta_seconds
            ),
        ));
    }
    if sim.timeout_secs <= 0.0 {
        return Err(ContractError::config_validation(
            "simulator.timeout_secs",
            format!("timeout_secs must be > 0, got {}", sim.timeout_secs),
        ));
    }
    Ok(())
}

fn validate_cameras(config: &AdasConfig) -> Result<(), ContractError> {
    let cams = &config.cameras;
    if cams.width == 0 || cams.height == 0 {
        return Err(ContractError::config_validation(
            "cameras.width / cameras.height",
            format!(
                "image size must be non-zero, got {}x{}",
                cams.width, cams.height
            ),
        ));
    }
    if cams.frequency_hz <= 0.0 {
        return Err(ContractError::config_validation(
            "cameras.frequency_hz",
            format!("frequency_hz must be > 0, got {}", cams.frequency_hz),
        ));
    }
    if !(cams.fov > 0.0 && cams.fov < 180.0) {
        return Err(ContractError::config_validation(
            "cameras.fov",
            format!("fov must be in (0, 180), got {}", cams.fov),
        ));
    }
    Ok(())
}

/// 校验检测参数
fn validate_detection(config: &AdasConfig) -> Result<(), ContractError> {
    let det = &config.detection;

    if det.skip_frames == 0 {
        return Err(ContractError::config_validation(
            "detection.skip_frames",
            "skip_frames must be >= 1",
        ));
    }

    if !(det.downscale_factor > 0.0 && det.downscale_factor <= 1.0) {
        return Err(ContractError::config_validation(
            "detection.downscale_factor",
            format!(
                "downscale_factor must be in (0, 1], got {}",
                det.downscale_factor
            ),
        ));
    }

    if det.inference_size == 0 {
        return Err(ContractError::config_validation(
            "detection.inference_size",
            "inference_size must be > 0",
        ));
    }

    if det.vehicle_keywords.is_empty() {
        return Err(ContractError::config_validation(
            "detection.vehicle_keywords",
            "at least one vehicle keyword is required",
        ));
    }
    if let Some(idx) = det
        .vehicle_keywords
        .iter()
        .position(|k| k.trim().is_empty())
    {
        return Err(ContractError::config_validation(
            format!("detection.vehicle_keywords[{idx}]"),
            "vehicle keyword cannot be empty",
        ));
    }

    if !(0.0..=1.0).contains(&det.confidence_threshold) {
        return Err(ContractError::config_validation(
            "detection.confidence_threshold",
            format!(
                "confidence_threshold must be in [0, 1], got {}",
                det.confidence_threshold
            ),
        ));
    }

    Ok(())
}

/// 校验时间相关参数
fn validate_timing(config: &AdasConfig) -> Result<(), ContractError> {
    if config.main_loop.target_fps == 0 {
        return Err(ContractError::config_validation(
            "loop.target_fps",
            "target_fps must be > 0",
        ));
    }

    let clear_time = config.alerts.warning_clear_time;
    if !clear_time.is_finite() || clear_time < 0.0 {
        return Err(ContractError::config_validation(
            "alerts.warning_clear_time",
            format!("warning_clear_time must be >= 0, got {clear_time}"),
        ));
    }

    Ok(())
}

/// 校验 sink 配置
fn validate_sinks(config: &AdasConfig) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, sink) in config.sinks.iter().enumerate() {
        if sink.name.is_empty() {
            return Err(ContractError::config_validation(
                format!("sinks[{}].name", idx),
                "sink name cannot be empty",
            ));
        }
        if !seen.insert(sink.name.as_str()) {
            return Err(ContractError::config_validation(
                format!("sinks[name={}]", sink.name),
                "duplicate sink name",
            ));
        }
        if sink.queue_capacity == 0 {
            return Err(ContractError::config_validation(
                format!("sinks[{}].queue_capacity", idx),
                "queue_capacity must be > 0",
            ));
        }
    }
    Ok(())
}
