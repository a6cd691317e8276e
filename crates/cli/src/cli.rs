//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use contracts::EventMode;
use std::path::PathBuf;

/// Scene Pacer - trigger a camera as fast as scene setup allows
#[derive(Parser, Debug)]
#[command(
    name = "scene-pacer",
    author,
    version,
    about = "Scene-synchronized camera trigger pacing",
    long_about = "Triggers a camera in a loop while a simulated scene setup runs for every frame.\n\n\
                  Setup for the next frame starts on the exposure-end event when the camera \n\
                  reports one, otherwise when the previous frame is delivered."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "SCENE_PACER_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "SCENE_PACER_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the pacing session
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON); defaults are used when omitted
    #[arg(short, long, env = "SCENE_PACER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the number of trigger cycles per run
    #[arg(long, env = "SCENE_PACER_CYCLES")]
    pub cycles: Option<u32>,

    /// Override the scene setup delay in milliseconds
    #[arg(long, env = "SCENE_PACER_SETUP_DELAY_MS")]
    pub setup_delay_ms: Option<u64>,

    /// Override which event modes to run
    #[arg(long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Prometheus metrics port (disabled when omitted)
    #[arg(long, env = "SCENE_PACER_METRICS_PORT")]
    pub metrics_port: Option<u16>,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "pacer.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file; defaults are shown when omitted
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Event modes selectable from the command line
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeArg {
    /// Start setup when the frame is delivered
    FrameDelivered,
    /// Start setup at exposure end
    ExposureEnd,
    /// Frame-delivered run followed by exposure-end run
    Both,
}

impl ModeArg {
    pub fn runs(self) -> Vec<EventMode> {
        match self {
            Self::FrameDelivered => vec![EventMode::FrameDelivered],
            Self::ExposureEnd => vec![EventMode::ExposureEnd],
            Self::Both => vec![EventMode::FrameDelivered, EventMode::ExposureEnd],
        }
    }
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
