//! # Pacing
//!
//! Trigger pacing for scene-synchronized acquisition.
//!
//! Responsibilities:
//! - Wire camera notifications to the scene synchronizer (`attach_event_sources`)
//! - Run the image-wait / setup-wait / trigger loop (`PacingLoop`)
//! - Run both event modes back to back (`PacingSession`)
//! - Report cycle count, elapsed time and achieved rate (`PacingStats`)

mod error;
mod pacing_loop;
mod session;
mod sources;
mod stats;

pub use error::{PacingError, Result, WaitStage};
pub use pacing_loop::PacingLoop;
pub use session::PacingSession;
pub use sources::{attach_event_sources, EventSources, SourceCounters};
pub use stats::PacingStats;
