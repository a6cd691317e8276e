//! Layered error definitions
//!
//! Categorized by source: config / device / pacing

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Device Errors =====
    /// Trigger could not be delivered to the device
    #[error("trigger failed: {message}")]
    Trigger { message: String },

    /// Device was stopped or disconnected
    #[error("device stopped: {message}")]
    DeviceStopped { message: String },

    /// Feature not supported by the device
    #[error("unsupported device feature: {feature}")]
    Unsupported { feature: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create trigger error
    pub fn trigger(message: impl Into<String>) -> Self {
        Self::Trigger {
            message: message.into(),
        }
    }

    /// Create device stopped error
    pub fn device_stopped(message: impl Into<String>) -> Self {
        Self::DeviceStopped {
            message: message.into(),
        }
    }

    pub fn unsupported(feature: impl Into<String>) -> Self {
        Self::Unsupported {
            feature: feature.into(),
        }
    }
}
