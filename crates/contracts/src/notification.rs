//! Camera event notifications consumed by the event sources.

use std::sync::Arc;

use crate::FrameId;

/// The sensor finished integrating a frame; image data is still being transmitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExposureEndNotification {
    pub frame_id: FrameId,
}

/// An image was fully received by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameDeliveredNotification {
    pub frame_id: FrameId,
}

/// Exposure-end notification callback
///
/// Invoked on the camera's event-delivery thread.
pub type ExposureEndCallback = Arc<dyn Fn(ExposureEndNotification) + Send + Sync>;

/// Frame-delivered notification callback
///
/// Invoked on the camera's frame-delivery thread.
pub type FrameDeliveredCallback = Arc<dyn Fn(FrameDeliveredNotification) + Send + Sync>;
