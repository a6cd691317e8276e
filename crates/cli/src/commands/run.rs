//! `run` command implementation.

use std::sync::Arc;

use acquisition::MockCamera;
use anyhow::{Context, Result};
use contracts::{EventMode, PacerConfig};
use pacing::{PacingSession, PacingStats};
use sync_engine::SceneSynchronizer;
use tracing::{info, warn};

use super::load_config;
use crate::cli::RunArgs;
use crate::error::CliError;

/// Execute the `run` command
pub async fn run_session(args: &RunArgs) -> Result<()> {
    let config = resolve_config(args)?;

    info!(
        setup_delay_ms = config.scene.setup_delay_ms,
        transmission_ms = config.camera.transmission_ms,
        cycles = config.pacing.cycles,
        runs = config.runs.len(),
        "Configuration loaded"
    );

    if let Some(port) = args.metrics_port {
        observability::init_metrics_only(port)?;
    }

    let camera = Arc::new(MockCamera::new(config.camera.clone()));
    let synchronizer = SceneSynchronizer::new(config.scene.clone());
    let mut session = PacingSession::new(camera.clone(), synchronizer, config.pacing.clone());
    let runs = config.runs.clone();

    let mut task = tokio::task::spawn_blocking(move || session.run_all(&runs));

    let finished = tokio::select! {
        joined = &mut task => Some(joined),
        _ = shutdown_signal() => None,
    };

    let Some(joined) = finished else {
        warn!("Received shutdown signal, stopping camera...");
        // A stopped camera rejects the next trigger, which ends the loop
        let stopper = camera.clone();
        tokio::task::spawn_blocking(move || stopper.stop())
            .await
            .context("Failed to stop camera")?;
        let _ = task.await;
        info!("Pacing session interrupted");
        return Ok(());
    };

    let stats = joined
        .map_err(|e| CliError::task_aborted(e.to_string()))?
        .map_err(CliError::from)?;

    print_report(&stats);
    info!(runs = stats.len(), "Scene Pacer finished");
    Ok(())
}

/// Load configuration and apply command-line overrides
fn resolve_config(args: &RunArgs) -> Result<PacerConfig, CliError> {
    let mut config = load_config(args.config.as_deref())?;

    if let Some(cycles) = args.cycles {
        info!(cycles, "Overriding cycle count from CLI");
        config.pacing.cycles = cycles;
    }
    if let Some(delay) = args.setup_delay_ms {
        info!(setup_delay_ms = delay, "Overriding setup delay from CLI");
        config.scene.setup_delay_ms = delay;
    }
    if let Some(mode) = args.mode {
        config.runs = mode.runs();
    }

    config_loader::ConfigLoader::validate(&config).map_err(CliError::InvalidOverride)?;
    Ok(config)
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

fn print_report(stats: &[PacingStats]) {
    for run in stats {
        println!("\n{run}");
    }

    let rate_of = |mode: EventMode| stats.iter().find(|s| s.mode == mode).map(PacingStats::rate);
    if let (Some(delivered), Some(exposure_end)) = (
        rate_of(EventMode::FrameDelivered),
        rate_of(EventMode::ExposureEnd),
    ) {
        if delivered > 0.0 {
            println!(
                "\nExposure-end pacing: {:.2}x the frame-delivered rate",
                exposure_end / delivered
            );
        }
    }
    println!();
}
