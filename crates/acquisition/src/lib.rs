//! # Acquisition
//!
//! Simulated acquisition devices.
//!
//! Responsibilities:
//! - Provide a trigger-mode camera implementing `TriggerCommand` and `CameraSource`
//! - Deliver exposure-end and frame-delivered notifications from device threads
//! - Count triggers and deliveries for diagnostics

pub mod mock_camera;

pub use contracts::{CameraSource, TriggerCommand};
pub use mock_camera::{CameraCounters, MockCamera};
