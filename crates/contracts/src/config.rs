//! PacerConfig - Config Loader output
//!
//! Describes one pacing session: scene-setup latency, camera timing,
//! loop length and which event sources to exercise.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete session configuration
///
/// Top-level keys (`version`, `runs`) must appear before the first table
/// header; unknown keys anywhere are rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PacerConfig {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Event modes to run, in order; the synchronizer is reset between runs
    #[serde(default = "default_runs")]
    pub runs: Vec<EventMode>,

    /// Scene setup simulation
    #[serde(default)]
    pub scene: SceneSyncConfig,

    /// Camera timing
    #[serde(default)]
    pub camera: CameraConfig,

    /// Pacing loop settings
    #[serde(default)]
    pub pacing: PacingConfig,
}

fn default_runs() -> Vec<EventMode> {
    vec![EventMode::FrameDelivered, EventMode::ExposureEnd]
}

impl Default for PacerConfig {
    fn default() -> Self {
        Self {
            version: ConfigVersion::default(),
            runs: default_runs(),
            scene: SceneSyncConfig::default(),
            camera: CameraConfig::default(),
            pacing: PacingConfig::default(),
        }
    }
}

/// Scene synchronizer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SceneSyncConfig {
    /// Time the environment needs to prepare for a new frame (milliseconds)
    #[serde(default = "default_setup_delay_ms")]
    pub setup_delay_ms: u64,
}

fn default_setup_delay_ms() -> u64 {
    40
}

impl SceneSyncConfig {
    /// Build from a `Duration`
    ///
    /// The delay is stored in whole milliseconds: sub-millisecond parts are
    /// truncated and values beyond `u64::MAX` ms saturate.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            setup_delay_ms: u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// Scene setup latency
    pub fn setup_delay(&self) -> Duration {
        Duration::from_millis(self.setup_delay_ms)
    }
}

impl Default for SceneSyncConfig {
    fn default() -> Self {
        Self {
            setup_delay_ms: default_setup_delay_ms(),
        }
    }
}

/// Simulated camera timing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CameraConfig {
    /// Exposure time (microseconds)
    #[serde(default = "default_exposure_us")]
    pub exposure_us: u64,

    /// Time to transmit an image after exposure end (milliseconds)
    #[serde(default = "default_transmission_ms")]
    pub transmission_ms: u64,

    /// Whether the device reports exposure-end events
    #[serde(default = "default_true")]
    pub exposure_end_events: bool,
}

fn default_exposure_us() -> u64 {
    1000
}

fn default_transmission_ms() -> u64 {
    20
}

fn default_true() -> bool {
    true
}

impl CameraConfig {
    pub fn exposure(&self) -> Duration {
        Duration::from_micros(self.exposure_us)
    }

    pub fn transmission(&self) -> Duration {
        Duration::from_millis(self.transmission_ms)
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            exposure_us: default_exposure_us(),
            transmission_ms: default_transmission_ms(),
            exposure_end_events: true,
        }
    }
}

/// Pacing loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PacingConfig {
    /// Number of trigger cycles per run
    #[serde(default = "default_cycles")]
    pub cycles: u32,

    /// Maximum wait for an image before aborting (None = wait forever)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_timeout_ms: Option<u64>,

    /// Maximum wait for scene setup before aborting (None = wait forever)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setup_timeout_ms: Option<u64>,
}

fn default_cycles() -> u32 {
    50
}

impl PacingConfig {
    pub fn with_cycles(cycles: u32) -> Self {
        Self {
            cycles,
            ..Default::default()
        }
    }

    pub fn image_timeout(&self) -> Option<Duration> {
        self.image_timeout_ms.map(Duration::from_millis)
    }

    pub fn setup_timeout(&self) -> Option<Duration> {
        self.setup_timeout_ms.map(Duration::from_millis)
    }
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            cycles: default_cycles(),
            image_timeout_ms: None,
            setup_timeout_ms: None,
        }
    }
}

/// Which event source requests the next scene setup early
///
/// The frame-delivered fallback is always active; `ExposureEnd` adds the
/// early source on top of it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventMode {
    /// Request setup only once the image is fully received
    #[default]
    FrameDelivered,
    /// Request setup as soon as exposure ends
    ExposureEnd,
}

impl EventMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FrameDelivered => "frame_delivered",
            Self::ExposureEnd => "exposure_end",
        }
    }
}

impl fmt::Display for EventMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
