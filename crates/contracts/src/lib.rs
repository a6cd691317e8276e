//! # Contracts
//!
//! Frozen interface contracts shared by every crate in the workspace.
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Frame Model
//! - `FrameId` is the device frame number of an acquisition cycle
//! - Frame ids are assumed to increase monotonically within a session
//! - "No frame requested yet" is `Option<FrameId>::None`, which orders below every id

mod camera_source;
mod config;
mod error;
mod frame;
mod notification;

pub use camera_source::{CameraSource, TriggerCommand};
pub use config::*;
pub use error::*;
pub use frame::*;
pub use notification::*;
