//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::PacerConfig;
use serde::Serialize;
use tracing::info;

use super::load_config;
use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    setup_delay_ms: u64,
    camera: CameraInfo,
    pacing: PacingInfo,
    runs: Vec<String>,
}

#[derive(Serialize)]
struct CameraInfo {
    exposure_us: u64,
    transmission_ms: u64,
    exposure_end_events: bool,
}

#[derive(Serialize)]
struct PacingInfo {
    cycles: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_timeout_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    setup_timeout_ms: Option<u64>,
    /// Lower bound on cycle time with setup started at frame delivery
    frame_delivered_cycle_ms: f64,
    /// Lower bound on cycle time with setup started at exposure end
    exposure_end_cycle_ms: f64,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    match &args.config {
        Some(path) => info!(config = %path.display(), "Loading configuration info"),
        None => info!("No configuration given, showing defaults"),
    }

    let config = load_config(args.config.as_deref())?;
    let info = build_config_info(&config);

    if args.json {
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&info);
    }

    Ok(())
}

fn build_config_info(config: &PacerConfig) -> ConfigInfo {
    let exposure_ms = config.camera.exposure().as_secs_f64() * 1000.0;
    let transmission_ms = config.camera.transmission().as_secs_f64() * 1000.0;
    let setup_ms = config.scene.setup_delay().as_secs_f64() * 1000.0;

    ConfigInfo {
        version: format!("{:?}", config.version),
        setup_delay_ms: config.scene.setup_delay_ms,
        camera: CameraInfo {
            exposure_us: config.camera.exposure_us,
            transmission_ms: config.camera.transmission_ms,
            exposure_end_events: config.camera.exposure_end_events,
        },
        pacing: PacingInfo {
            cycles: config.pacing.cycles,
            image_timeout_ms: config.pacing.image_timeout_ms,
            setup_timeout_ms: config.pacing.setup_timeout_ms,
            // Setup runs after the whole frame is in
            frame_delivered_cycle_ms: exposure_ms + transmission_ms + setup_ms,
            // Setup overlaps transmission
            exposure_end_cycle_ms: exposure_ms + transmission_ms.max(setup_ms),
        },
        runs: config.runs.iter().map(ToString::to_string).collect(),
    }
}

fn print_config_info(info: &ConfigInfo) {
    println!("\n=== Configuration Info ===\n");
    println!("Version: {}", info.version);
    println!("Scene setup delay: {} ms", info.setup_delay_ms);

    println!("\nCamera:");
    println!("  Exposure: {} us", info.camera.exposure_us);
    println!("  Transmission: {} ms", info.camera.transmission_ms);
    println!(
        "  Exposure-end events: {}",
        if info.camera.exposure_end_events {
            "yes"
        } else {
            "no"
        }
    );

    println!("\nPacing:");
    println!("  Cycles per run: {}", info.pacing.cycles);
    if let Some(timeout) = info.pacing.image_timeout_ms {
        println!("  Image timeout: {} ms", timeout);
    }
    if let Some(timeout) = info.pacing.setup_timeout_ms {
        println!("  Setup timeout: {} ms", timeout);
    }
    println!(
        "  Best-case cycle (frame delivered): {:.1} ms",
        info.pacing.frame_delivered_cycle_ms
    );
    println!(
        "  Best-case cycle (exposure end): {:.1} ms",
        info.pacing.exposure_end_cycle_ms
    );

    println!("\nRuns: {}", info.runs.join(" -> "));
    println!();
}
