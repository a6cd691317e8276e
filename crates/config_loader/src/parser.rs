//! 配置解析模块
//!
//! 支持 TOML (主要) 和 JSON (可选) 格式。

use contracts::{ContractError, PacerConfig};

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

fn parse_toml(content: &str) -> Result<PacerConfig, ContractError> {
    toml::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

fn parse_json(content: &str) -> Result<PacerConfig, ContractError> {
    serde_json::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("JSON parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// 根据格式解析配置
pub fn parse(content: &str, format: ConfigFormat) -> Result<PacerConfig, ContractError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::EventMode;

    #[test]
    fn test_parse_empty_toml_gives_defaults() {
        let config = parse_toml("").unwrap();
        assert_eq!(config.scene.setup_delay_ms, 40);
        assert_eq!(config.pacing.cycles, 50);
        assert_eq!(
            config.runs,
            vec![EventMode::FrameDelivered, EventMode::ExposureEnd]
        );
    }

    #[test]
    fn test_parse_json_partial() {
        let content = r#"{
            "camera": { "transmission_ms": 35, "exposure_end_events": false },
            "runs": ["frame_delivered"]
        }"#;
        let config = parse_json(content).unwrap();
        assert_eq!(config.camera.transmission_ms, 35);
        assert!(!config.camera.exposure_end_events);
        // Unset fields keep their defaults
        assert_eq!(config.camera.exposure_us, 1000);
        assert_eq!(config.runs, vec![EventMode::FrameDelivered]);
    }

    #[test]
    fn test_parse_toml_syntax_error() {
        let err = parse_toml("invalid toml [[[").unwrap_err();
        assert!(matches!(err, ContractError::ConfigParse { .. }));
    }

    #[test]
    fn test_parse_unknown_mode() {
        let err = parse_toml(r#"runs = ["exposure_start"]"#).unwrap_err();
        assert!(matches!(err, ContractError::ConfigParse { .. }));
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
