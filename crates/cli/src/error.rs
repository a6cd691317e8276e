//! Error types for CLI operations.

use std::path::PathBuf;

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {}", path.display())]
    ConfigNotFound { path: PathBuf },

    /// Configuration could not be loaded or failed validation
    #[error("Failed to load configuration from {}", path.display())]
    ConfigLoad {
        path: PathBuf,
        #[source]
        source: contracts::ContractError,
    },

    /// Configuration became invalid after CLI overrides
    #[error("Invalid configuration after overrides")]
    InvalidOverride(#[source] contracts::ContractError),

    /// Pacing session failed
    #[error("Pacing session failed")]
    Session(#[from] pacing::PacingError),

    /// Blocking pacing task did not finish cleanly
    #[error("Pacing task aborted: {message}")]
    TaskAborted { message: String },
}

impl CliError {
    pub fn config_not_found(path: impl Into<PathBuf>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn config_load(path: impl Into<PathBuf>, source: contracts::ContractError) -> Self {
        Self::ConfigLoad {
            path: path.into(),
            source,
        }
    }

    pub fn task_aborted(message: impl Into<String>) -> Self {
        Self::TaskAborted {
            message: message.into(),
        }
    }
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
