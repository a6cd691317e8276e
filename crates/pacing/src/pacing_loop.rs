//! Trigger pacing loop.
//!
//! Each cycle:
//! 1. wait until the previous image is fully received
//! 2. wait until scene setup for the next frame is complete
//! 3. issue one software trigger
//!
//! Scene setup for frame N+1 runs while image N is still being transmitted
//! whenever an early event source is attached, so step 2 often returns
//! without blocking.

use std::sync::Arc;
use std::time::{Duration, Instant};

use contracts::{EventMode, FrameId, PacingConfig, TriggerCommand, WaitOutcome};
use sync_engine::{ImageReceivedSignal, SceneSynchronizer};
use tracing::{info, instrument, trace, warn};

use crate::error::{PacingError, Result, WaitStage};
use crate::stats::PacingStats;

/// Drives a fixed number of trigger cycles
pub struct PacingLoop {
    synchronizer: SceneSynchronizer,
    image_signal: Arc<ImageReceivedSignal>,
    trigger: Arc<dyn TriggerCommand>,
    config: PacingConfig,
    mode: EventMode,
}

impl PacingLoop {
    pub fn new(
        synchronizer: SceneSynchronizer,
        image_signal: Arc<ImageReceivedSignal>,
        trigger: Arc<dyn TriggerCommand>,
        config: PacingConfig,
    ) -> Self {
        Self {
            synchronizer,
            image_signal,
            trigger,
            config,
            mode: EventMode::default(),
        }
    }

    /// Label the run with the event mode its sources use
    pub fn with_mode(mut self, mode: EventMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn config(&self) -> &PacingConfig {
        &self.config
    }

    /// Run all cycles and report timing
    ///
    /// # Errors
    /// - `PacingError::Timeout` if a configured wait bound expires
    /// - `PacingError::Trigger` if the trigger cannot be issued
    #[instrument(
        name = "pacing_loop_run",
        skip(self),
        fields(mode = %self.mode, cycles = self.config.cycles)
    )]
    pub fn run(&self) -> Result<PacingStats> {
        let mut stats = PacingStats::new(self.mode, self.config.cycles);

        // No image in flight before the first trigger
        self.image_signal.reset_to(true);
        self.synchronizer.begin_setup(FrameId::FIRST);

        info!("Running {} cycles...", self.config.cycles);
        let start = Instant::now();

        for cycle in 0..self.config.cycles {
            let image_wait = self.wait(WaitStage::Image, cycle)?;
            stats.image_wait_ms.push(as_millis_f64(image_wait));

            let setup_wait = self.wait(WaitStage::Setup, cycle)?;
            stats.setup_wait_ms.push(as_millis_f64(setup_wait));

            self.trigger
                .trigger()
                .map_err(|source| PacingError::Trigger { cycle, source })?;

            stats.cycles_completed += 1;
            observability::record_cycle_completed(self.mode.as_str());
            trace!(cycle, "trigger issued");
        }

        stats.elapsed = start.elapsed();
        observability::record_run_rate(self.mode.as_str(), stats.rate());

        info!(
            cycles = stats.cycles_completed,
            elapsed_ms = stats.elapsed.as_millis() as u64,
            rate = format!("{:.2}", stats.rate()),
            "Pacing run finished"
        );

        Ok(stats)
    }

    fn wait(&self, stage: WaitStage, cycle: u32) -> Result<Duration> {
        let started = Instant::now();

        let outcome = match stage {
            WaitStage::Image => match self.config.image_timeout() {
                Some(timeout) => self.image_signal.wait_timeout(timeout),
                None => {
                    self.image_signal.wait();
                    WaitOutcome::Completed
                }
            },
            WaitStage::Setup => match self.config.setup_timeout() {
                Some(timeout) => self.synchronizer.wait_completion_timeout(timeout),
                None => {
                    self.synchronizer.wait_completion();
                    WaitOutcome::Completed
                }
            },
        };

        let waited = started.elapsed();
        observability::record_cycle_wait(stage.as_str(), as_millis_f64(waited));

        match outcome {
            WaitOutcome::Completed => Ok(waited),
            WaitOutcome::TimedOut => {
                warn!(cycle, stage = %stage, waited_ms = as_millis_f64(waited), "wait timed out");
                Err(PacingError::Timeout {
                    stage,
                    cycle,
                    waited,
                })
            }
        }
    }
}

fn as_millis_f64(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{ContractError, SceneSyncConfig};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::thread;

    /// Trigger that delivers the "image" and completes setup instantly
    struct LoopbackTrigger {
        signal: Arc<ImageReceivedSignal>,
        sync: SceneSynchronizer,
        count: AtomicU32,
    }

    impl TriggerCommand for LoopbackTrigger {
        fn trigger(&self) -> std::result::Result<(), ContractError> {
            let frame = self.count.fetch_add(1, Ordering::SeqCst);
            self.signal.notify();
            self.sync.begin_setup(FrameId(frame as u64 + 1));
            Ok(())
        }
    }

    struct SilentTrigger;

    impl TriggerCommand for SilentTrigger {
        fn trigger(&self) -> std::result::Result<(), ContractError> {
            Ok(())
        }
    }

    struct FailingTrigger;

    impl TriggerCommand for FailingTrigger {
        fn trigger(&self) -> std::result::Result<(), ContractError> {
            Err(ContractError::trigger("cable unplugged"))
        }
    }

    fn sync(delay_ms: u64) -> SceneSynchronizer {
        SceneSynchronizer::new(SceneSyncConfig {
            setup_delay_ms: delay_ms,
        })
    }

    #[test]
    fn test_run_completes_all_cycles() {
        let sync = sync(5);
        let signal = Arc::new(ImageReceivedSignal::new(false));
        let trigger = Arc::new(LoopbackTrigger {
            signal: signal.clone(),
            sync: sync.clone(),
            count: AtomicU32::new(0),
        });

        let pacing = PacingLoop::new(sync, signal, trigger.clone(), PacingConfig::with_cycles(5))
            .with_mode(EventMode::ExposureEnd);
        let stats = pacing.run().unwrap();

        assert_eq!(stats.cycles_completed, 5);
        assert_eq!(trigger.count.load(Ordering::SeqCst), 5);
        assert_eq!(stats.mode, EventMode::ExposureEnd);
        assert_eq!(stats.setup_wait_ms.count(), 5);
        // Each cycle waits out one setup delay
        assert!(stats.elapsed >= Duration::from_millis(5 * 4));
        assert!(stats.rate() > 0.0);
    }

    #[test]
    fn test_image_timeout() {
        let sync = sync(1);
        let signal = Arc::new(ImageReceivedSignal::default());
        // Trigger never produces an image
        let trigger: Arc<dyn TriggerCommand> = Arc::new(SilentTrigger);
        let config = PacingConfig {
            cycles: 3,
            image_timeout_ms: Some(20),
            setup_timeout_ms: Some(1000),
        };

        let err = PacingLoop::new(sync, signal, trigger, config)
            .run()
            .unwrap_err();

        match err {
            PacingError::Timeout { stage, cycle, .. } => {
                assert_eq!(stage, WaitStage::Image);
                assert_eq!(cycle, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_setup_timeout() {
        let sync = SceneSynchronizer::new(SceneSyncConfig {
            setup_delay_ms: 10_000,
        });
        let signal = Arc::new(ImageReceivedSignal::default());
        let config = PacingConfig {
            cycles: 1,
            image_timeout_ms: None,
            setup_timeout_ms: Some(20),
        };

        let err = PacingLoop::new(sync, signal, Arc::new(FailingTrigger), config)
            .run()
            .unwrap_err();
        assert!(err.is_timeout());
        assert!(err.to_string().contains("setup"));
    }

    #[test]
    fn test_trigger_failure_reports_cycle() {
        let sync = sync(1);
        let signal = Arc::new(ImageReceivedSignal::default());

        let pacing = PacingLoop::new(
            sync,
            signal,
            Arc::new(FailingTrigger),
            PacingConfig::with_cycles(2),
        );
        let err = pacing.run().unwrap_err();
        assert!(matches!(err, PacingError::Trigger { cycle: 0, .. }));
    }

    #[test]
    fn test_first_setup_is_requested_by_loop() {
        let sync = sync(30);
        let signal = Arc::new(ImageReceivedSignal::default());
        let pacing = PacingLoop::new(
            sync.clone(),
            signal.clone(),
            Arc::new(LoopbackTrigger {
                signal,
                sync: sync.clone(),
                count: AtomicU32::new(0),
            }),
            PacingConfig::with_cycles(1),
        );

        let handle = thread::spawn(move || pacing.run());
        let stats = handle.join().unwrap().unwrap();

        // Cycle 0 waited for the frame-0 setup started by the loop itself
        assert!(stats.setup_wait_ms.max() >= 25.0);
        assert_eq!(sync.stats().requests_accepted, 2);
    }
}
