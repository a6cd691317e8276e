//! Exposure-End Pacing Example
//!
//! Runs the trigger loop twice against the mock camera: first starting scene
//! setup when each frame is delivered, then starting it at exposure end.
//! The second run overlaps setup with image transmission and should reach a
//! visibly higher cycle rate.
//!
//! Run with: cargo run --bin exposure_end_pacing [-- demos/pacer.toml]

use std::path::Path;
use std::sync::Arc;

use acquisition::MockCamera;
use config_loader::ConfigLoader;
use contracts::PacerConfig;
use pacing::PacingSession;
use sync_engine::SceneSynchronizer;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    observability::init()?;

    tracing::info!("Starting Exposure-End Pacing Demo");

    // ==== Stage 1: Use default config or load from file ====
    let config = if let Some(path) = std::env::args().nth(1) {
        tracing::info!(path = %path, "Loading pacer config");
        ConfigLoader::load_from_path(Path::new(&path))?
    } else {
        PacerConfig::default()
    };

    // ==== Stage 2: Start the mock camera ====
    let camera = Arc::new(MockCamera::new(config.camera.clone()));
    tracing::info!(
        exposure_us = config.camera.exposure_us,
        transmission_ms = config.camera.transmission_ms,
        "Mock camera ready"
    );

    // ==== Stage 3: Run each mode ====
    let synchronizer = SceneSynchronizer::new(config.scene.clone());
    let mut session = PacingSession::new(camera.clone(), synchronizer, config.pacing.clone());

    let stats = session.run_all(&config.runs)?;

    // ==== Stage 4: Report ====
    for run in &stats {
        println!("\n{run}");
    }

    let counters = camera.counters();
    println!(
        "\nCamera: {} triggers, {} exposure-end events, {} frames delivered",
        counters.triggers(),
        counters.exposure_events(),
        counters.frames_delivered()
    );

    camera.stop();
    tracing::info!("Demo finished");
    Ok(())
}
