//! Multi-run pacing session.
//!
//! Runs the pacing loop once per configured event mode against the same
//! camera and synchronizer, resetting the synchronizer between runs so the
//! runs are independent.

use std::sync::Arc;
use std::time::Duration;

use contracts::{CameraSource, EventMode, PacingConfig, TriggerCommand};
use sync_engine::{ImageReceivedSignal, SceneSynchronizer};
use tracing::{debug, info};

use crate::error::Result;
use crate::pacing_loop::PacingLoop;
use crate::sources::attach_event_sources;
use crate::stats::PacingStats;

/// Upper bound for waiting on the last image of a run when no image timeout is configured
const DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Pacing session over one camera
pub struct PacingSession<C> {
    camera: Arc<C>,
    synchronizer: SceneSynchronizer,
    image_signal: Arc<ImageReceivedSignal>,
    config: PacingConfig,
    runs_completed: usize,
}

impl<C> PacingSession<C>
where
    C: TriggerCommand + CameraSource + 'static,
{
    pub fn new(camera: Arc<C>, synchronizer: SceneSynchronizer, config: PacingConfig) -> Self {
        Self {
            camera,
            synchronizer,
            image_signal: Arc::new(ImageReceivedSignal::default()),
            config,
            runs_completed: 0,
        }
    }

    pub fn synchronizer(&self) -> &SceneSynchronizer {
        &self.synchronizer
    }

    /// Run one pacing loop with the given event mode
    pub fn run(&mut self, mode: EventMode) -> Result<PacingStats> {
        if self.runs_completed > 0 {
            self.synchronizer.reset();
        }

        info!(mode = %mode, "Starting pacing run");

        let sources = attach_event_sources(
            self.camera.clone(),
            &self.synchronizer,
            &self.image_signal,
            mode,
        )?;

        let pacing = PacingLoop::new(
            self.synchronizer.clone(),
            self.image_signal.clone(),
            self.camera.clone(),
            self.config.clone(),
        )
        .with_mode(mode);

        let stats = pacing.run();

        // Let the last triggered frame arrive before detaching, so it cannot
        // leak into the next run.
        if stats.is_ok() {
            let drain = self.config.image_timeout().unwrap_or(DRAIN_TIMEOUT);
            let outcome = self.image_signal.wait_timeout(drain);
            debug!(?outcome, "drained final frame");
        }
        drop(sources);
        self.runs_completed += 1;

        stats
    }

    /// Run every mode in order, stopping at the first failure
    pub fn run_all(&mut self, modes: &[EventMode]) -> Result<Vec<PacingStats>> {
        modes.iter().map(|&mode| self.run(mode)).collect()
    }
}
