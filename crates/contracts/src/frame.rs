//! Frame identifiers and synchronizer outcomes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Device frame number identifying one acquisition cycle
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct FrameId(pub u64);

impl FrameId {
    /// First frame of a session
    pub const FIRST: FrameId = FrameId(0);

    /// Create a frame id from a raw device frame number
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw device frame number
    pub const fn get(self) -> u64 {
        self.0
    }

    /// The frame following this one (saturates at `u64::MAX`)
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl From<u64> for FrameId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Result of a `begin_setup` call
///
/// `Ignored` is routine: it means a setup for this frame (or a later one)
/// was already requested, typically by the other event source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupRequest {
    /// New setup work was started for the frame
    Accepted,
    /// Frame id was not above the highest requested id; nothing happened
    Ignored,
}

impl SetupRequest {
    /// Whether new setup work was started
    pub fn is_accepted(self) -> bool {
        matches!(self, Self::Accepted)
    }
}

/// Result of a bounded wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The awaited signal was observed (and consumed)
    Completed,
    /// The timeout elapsed first; nothing was consumed
    TimedOut,
}

impl WaitOutcome {
    pub fn is_completed(self) -> bool {
        matches!(self, Self::Completed)
    }

    pub fn is_timed_out(self) -> bool {
        matches!(self, Self::TimedOut)
    }
}
