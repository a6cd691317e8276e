//! Pacing run statistics.

use std::fmt;
use std::time::Duration;

use contracts::EventMode;
use observability::RunningStats;

/// Statistics from one pacing run
#[derive(Debug, Clone, Default)]
pub struct PacingStats {
    /// Event mode the run used
    pub mode: EventMode,

    /// Cycles the run was asked to perform
    pub cycles_requested: u32,

    /// Triggers actually issued
    pub cycles_completed: u32,

    /// Wall time from the first wait to the last trigger
    pub elapsed: Duration,

    /// Time spent waiting for the previous image (ms)
    pub image_wait_ms: RunningStats,

    /// Time spent waiting for scene setup (ms)
    pub setup_wait_ms: RunningStats,
}

impl PacingStats {
    pub fn new(mode: EventMode, cycles_requested: u32) -> Self {
        Self {
            mode,
            cycles_requested,
            ..Default::default()
        }
    }

    /// Achieved cycle rate (cycles per second)
    pub fn rate(&self) -> f64 {
        if self.elapsed.as_secs_f64() > 0.0 {
            self.cycles_completed as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Mean cycle time in milliseconds
    pub fn mean_cycle_ms(&self) -> f64 {
        if self.cycles_completed > 0 {
            self.elapsed.as_secs_f64() * 1000.0 / self.cycles_completed as f64
        } else {
            0.0
        }
    }

    pub fn is_complete(&self) -> bool {
        self.cycles_completed == self.cycles_requested
    }
}

impl fmt::Display for PacingStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Pacing Run: {} ===", self.mode)?;
        writeln!(
            f,
            "Processed {} cycles in {} ms ({:.2} cycles/sec)",
            self.cycles_completed,
            self.elapsed.as_millis(),
            self.rate()
        )?;
        writeln!(f, "Mean cycle time (ms): {:.3}", self.mean_cycle_ms())?;
        writeln!(f, "Image wait (ms): {}", self.image_wait_ms.summary())?;
        write!(f, "Setup wait (ms): {}", self.setup_wait_ms.summary())
    }
}
