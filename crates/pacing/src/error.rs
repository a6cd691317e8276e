//! Pacing loop errors

use std::time::Duration;

use contracts::ContractError;
use thiserror::Error;

/// Stage of a pacing cycle that can block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitStage {
    /// Waiting for the previous image to be fully received
    Image,
    /// Waiting for scene setup to complete
    Setup,
}

impl WaitStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Setup => "setup",
        }
    }
}

impl std::fmt::Display for WaitStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pacing errors
#[derive(Debug, Error)]
pub enum PacingError {
    /// A bounded wait expired
    #[error("cycle {cycle}: timed out after {waited:?} waiting for {stage}")]
    Timeout {
        stage: WaitStage,
        cycle: u32,
        waited: Duration,
    },

    /// The trigger could not be issued
    #[error("cycle {cycle}: trigger failed")]
    Trigger {
        cycle: u32,
        #[source]
        source: ContractError,
    },

    /// Camera cannot serve the requested event mode
    #[error("camera error: {0}")]
    Device(#[from] ContractError),
}

impl PacingError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Result type alias for pacing operations
pub type Result<T> = std::result::Result<T, PacingError>;
