//! 配置解析模块
//!
//! 支持 TOML (主要) 和 JSON (可选) 格式。

use contracts::{AdasConfig, ContractError};

/// 配置文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML 格式 (推荐)
    Toml,
    /// JSON 格式
    Json,
}

impl ConfigFormat {
    /// 从文件扩展名推断格式
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// 解析 TOML 格式配置
pub fn parse_toml(content: &str) -> Result<AdasConfig, ContractError> {
    toml::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// 解析 JSON 格式配置
pub fn parse_json(content: &str) -> Result<AdasConfig, ContractError> {
    serde_json::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("JSON parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// 根据格式解析配置
pub fn parse(content: &str, format: ConfigFormat) -> Result<AdasConfig, ContractError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::SinkType;

    #[test]
    fn test_parse_empty_toml_uses_defaults() {
        let config = parse_toml("").unwrap();
        assert_eq!(config.detection.skip_frames, 3);
        assert_eq!(config.main_loop.target_fps, 30);
        assert_eq!(config.detection.vehicle_keywords, vec!["car", "truck", "bus"]);
        assert_eq!(config.sinks.len(), 1);
    }

    #[test]
    fn test_parse_toml_sections() {
        let content = r#"
[simulator]
host = "10.0.0.5"
traffic_vehicles = 5
seed = 7

[detection]
skip_frames = 2
vehicle_keywords = ["car"]

[loop]
target_fps = 20
max_ticks = 100

[[sinks]]
name = "console"
sink_type = "log"
"#;
        let config = parse_toml(content).unwrap();
        assert_eq!(config.simulator.host, "10.0.0.5");
        assert_eq!(config.simulator.port, 2000);
        assert_eq!(config.simulator.seed, Some(7));
        assert_eq!(config.detection.skip_frames, 2);
        assert_eq!(config.detection.inference_size, 160);
        assert_eq!(config.main_loop.max_ticks, Some(100));
        assert_eq!(config.sinks.len(), 1);
        assert_eq!(config.sinks[0].sink_type, SinkType::Log);
    }

    #[test]
    fn test_parse_json_minimal() {
        let content = r#"{
            "alerts": { "warning_clear_time": 1.0 },
            "sinks": [{ "name": "csv", "sink_type": "csv", "params": { "dir": "out" } }]
        }"#;
        let config = parse_json(content).unwrap();
        assert_eq!(config.alerts.warning_clear_time, 1.0);
        assert_eq!(config.sinks[0].params.get("dir").map(String::as_str), Some("out"));
    }

    #[test]
    fn test_parse_toml_syntax_error() {
        let content = "invalid toml [[[";
        let result = parse_toml(content);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ContractError::ConfigParse { .. }));
    }

    #[test]
    fn test_unknown_sink_type_rejected() {
        let content = r#"
[[sinks]]
name = "udp"
sink_type = "network"
"#;
        assert!(parse_toml(content).is_err());
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            ConfigFormat::from_extension("toml"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("TOML"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("json"),
            Some(ConfigFormat::Json)
        );
        assert_eq!(ConfigFormat::from_extension("yaml"), None);
    }
}
