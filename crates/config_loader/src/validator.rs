//! 配置校验模块
//!
//! 校验规则：
//! - setup_delay_ms > 0
//! - cycles > 0
//! - 超时 (若设置) > 0
//! - runs 非空
//! - exposure_end 模式要求相机启用曝光结束事件

use contracts::{ContractError, EventMode, PacerConfig};

/// 校验 PacerConfig 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(config: &PacerConfig) -> Result<(), ContractError> {
    validate_scene(config)?;
    validate_pacing(config)?;
    validate_runs(config)?;
    Ok(())
}

/// 校验场景准备延迟
fn validate_scene(config: &PacerConfig) -> Result<(), ContractError> {
    if config.scene.setup_delay_ms == 0 {
        return Err(ContractError::config_validation(
            "scene.setup_delay_ms",
            "setup_delay_ms must be > 0",
        ));
    }
    Ok(())
}

/// 校验节拍循环参数
fn validate_pacing(config: &PacerConfig) -> Result<(), ContractError> {
    let pacing = &config.pacing;

    if pacing.cycles == 0 {
        return Err(ContractError::config_validation(
            "pacing.cycles",
            "cycles must be > 0",
        ));
    }

    let timeouts = [
        ("pacing.image_timeout_ms", pacing.image_timeout_ms),
        ("pacing.setup_timeout_ms", pacing.setup_timeout_ms),
    ];
    for (field, timeout) in timeouts {
        if timeout == Some(0) {
            return Err(ContractError::config_validation(
                field,
                "timeout must be > 0 when set",
            ));
        }
    }

    Ok(())
}

/// 校验运行模式列表
fn validate_runs(config: &PacerConfig) -> Result<(), ContractError> {
    if config.runs.is_empty() {
        return Err(ContractError::config_validation(
            "runs",
            "at least one event mode is required",
        ));
    }

    // 曝光结束模式依赖相机事件
    if !config.camera.exposure_end_events {
        if let Some(idx) = config
            .runs
            .iter()
            .position(|mode| *mode == EventMode::ExposureEnd)
        {
            return Err(ContractError::config_validation(
                format!("runs[{idx}]"),
                "exposure_end mode requires camera.exposure_end_events = true",
            ));
        }
    }

    Ok(())
}
