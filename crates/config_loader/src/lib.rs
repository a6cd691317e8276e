//! # Config Loader
//!
//! Loads the pacing session configuration.
//!
//! Responsibilities:
//! - Parse TOML/JSON configuration files
//! - Validate configuration legality
//! - Produce a `PacerConfig`
//!
//! Every section is optional; an empty file yields the defaults.
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let config = ConfigLoader::load_from_path(Path::new("pacer.toml")).unwrap();
//! println!("setup delay: {:?}", config.scene.setup_delay());
//! ```

mod parser;
mod validator;

pub use contracts::PacerConfig;
pub use parser::ConfigFormat;

use contracts::ContractError;
use std::path::Path;
use tracing::debug;

/// Configuration loader
///
/// Provides static methods to load configuration from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file path
    ///
    /// Automatically detects format from file extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<PacerConfig, ContractError> {
        let format = Self::detect_format(path)?;
        let content = std::fs::read_to_string(path)?;
        let config = Self::load_from_str(&content, format)?;
        debug!(path = %path.display(), ?format, "configuration loaded");
        Ok(config)
    }

    /// Load configuration from string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(content: &str, format: ConfigFormat) -> Result<PacerConfig, ContractError> {
        let config = parser::parse(content, format)?;
        validator::validate(&config)?;
        Ok(config)
    }

    /// Validate an already-built configuration (e.g. after CLI overrides)
    pub fn validate(config: &PacerConfig) -> Result<(), ContractError> {
        validator::validate(config)
    }

    /// Serialize to TOML string
    pub fn to_toml(config: &PacerConfig) -> Result<String, ContractError> {
        toml::to_string_pretty(config)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize to JSON string
    pub fn to_json(config: &PacerConfig) -> Result<String, ContractError> {
        serde_json::to_string_pretty(config)
            .map_err(|e| ContractError::config_parse(format!("JSON serialize error: {e}")))
    }

    /// Infer configuration format from file extension
    fn detect_format(path: &Path) -> Result<ConfigFormat, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::EventMode;
    use std::io::Write;

    const SESSION_TOML: &str = r#"
runs = ["exposure_end"]

[scene]
setup_delay_ms = 40

[camera]
exposure_us = 1000
transmission_ms = 20
exposure_end_events = true

[pacing]
cycles = 100
image_timeout_ms = 2000
"#;

    #[test]
    fn test_load_from_str_toml() {
        let config = ConfigLoader::load_from_str(SESSION_TOML, ConfigFormat::Toml)
            .expect("valid config");
        assert_eq!(config.pacing.cycles, 100);
        assert_eq!(config.pacing.image_timeout_ms, Some(2000));
        assert_eq!(config.runs, vec![EventMode::ExposureEnd]);
    }

    #[test]
    fn test_round_trip_toml() {
        let config = ConfigLoader::load_from_str(SESSION_TOML, ConfigFormat::Toml).unwrap();
        let serialized = ConfigLoader::to_toml(&config).unwrap();
        let reloaded = ConfigLoader::load_from_str(&serialized, ConfigFormat::Toml).unwrap();
        assert_eq!(reloaded.pacing.cycles, config.pacing.cycles);
        assert_eq!(reloaded.runs, config.runs);
    }

    #[test]
    fn test_json_export_loads_back() {
        let config = ConfigLoader::load_from_str(SESSION_TOML, ConfigFormat::Toml).unwrap();
        let json = ConfigLoader::to_json(&config).unwrap();
        let reloaded = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();
        assert_eq!(reloaded.scene.setup_delay_ms, 40);
        assert_eq!(reloaded.camera.transmission_ms, 20);
    }

    #[test]
    fn test_misplaced_runs_rejected() {
        // Under `[pacing]` the key would silently become `pacing.runs`
        let content = "[pacing]\ncycles = 5\nruns = [\"exposure_end\"]\n";
        let err = ConfigLoader::load_from_str(content, ConfigFormat::Toml).unwrap_err();
        assert!(matches!(err, ContractError::ConfigParse { .. }));
        assert!(err.to_string().contains("runs"), "got: {err}");
    }

    #[test]
    fn test_validation_runs_after_parse() {
        let content = "[pacing]\ncycles = 0\n";
        let err = ConfigLoader::load_from_str(content, ConfigFormat::Toml).unwrap_err();
        assert!(err.to_string().contains("cycles"), "got: {err}");
    }

    #[test]
    fn test_load_from_path_detects_format() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{ "scene": {{ "setup_delay_ms": 15 }} }}"#).unwrap();

        let config = ConfigLoader::load_from_path(file.path()).unwrap();
        assert_eq!(config.scene.setup_delay_ms, 15);
        assert_eq!(config.runs.len(), 2);
    }

    #[test]
    fn test_load_from_path_rejects_unknown_extension() {
        let file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        let err = ConfigLoader::load_from_path(file.path()).unwrap_err();
        assert!(matches!(err, ContractError::ConfigParse { .. }));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ConfigLoader::load_from_path(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ContractError::Io(_)));
    }
}
