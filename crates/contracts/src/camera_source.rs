//! Camera collaborator traits.
//!
//! Defines the surface the pacing loop needs from an acquisition device,
//! decoupling it from any concrete camera SDK. Real devices and the mock
//! camera implement the same traits.

use crate::{ContractError, ExposureEndCallback, FrameDeliveredCallback};

/// Fire-and-forget software trigger
///
/// Requested exactly once per pacing cycle. Implementations must not block
/// until the image arrives; delivery is reported through [`CameraSource`].
pub trait TriggerCommand: Send + Sync {
    /// Issue one trigger
    fn trigger(&self) -> Result<(), ContractError>;
}

/// Source of camera event notifications
///
/// # Design Principles
///
/// 1. **Callback Pattern**: notifications are pushed from the device's own threads,
///    consistent with how camera SDKs deliver events
/// 2. **Replaceable Handlers**: registering a handler replaces the previous one
///
/// # Example
///
/// ```ignore
/// camera.on_frame_delivered(Arc::new(|n| {
///     println!("frame {} received", n.frame_id);
/// }));
/// ```
pub trait CameraSource: Send + Sync {
    /// Whether the device can report exposure end ahead of image delivery
    fn supports_exposure_end(&self) -> bool;

    /// Register the exposure-end handler
    fn on_exposure_end(&self, callback: ExposureEndCallback);

    /// Register the frame-delivered handler
    fn on_frame_delivered(&self, callback: FrameDeliveredCallback);

    /// Remove all registered handlers
    fn clear_handlers(&self);
}
