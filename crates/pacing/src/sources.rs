//! Event sources feeding the scene synchronizer.
//!
//! Two producers request setup for the *next* frame:
//! - exposure end (early): the image is still being transmitted
//! - frame delivered (fallback): the image is fully received; also releases
//!   the pacing thread's image wait
//!
//! When both are active they race for the same frame id and the
//! synchronizer keeps whichever arrives first.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use contracts::{CameraSource, ContractError, EventMode, SetupRequest};
use sync_engine::{ImageReceivedSignal, SceneSynchronizer};
use tracing::{debug, trace};

/// Per-source request counters
#[derive(Debug, Default)]
pub struct SourceCounters {
    exposure_end_accepted: AtomicU64,
    exposure_end_ignored: AtomicU64,
    frame_delivered_accepted: AtomicU64,
    frame_delivered_ignored: AtomicU64,
}

impl SourceCounters {
    fn record_exposure_end(&self, request: SetupRequest) {
        let counter = match request {
            SetupRequest::Accepted => &self.exposure_end_accepted,
            SetupRequest::Ignored => &self.exposure_end_ignored,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn record_frame_delivered(&self, request: SetupRequest) {
        let counter = match request {
            SetupRequest::Accepted => &self.frame_delivered_accepted,
            SetupRequest::Ignored => &self.frame_delivered_ignored,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Setup requests started by exposure-end events
    pub fn exposure_end_accepted(&self) -> u64 {
        self.exposure_end_accepted.load(Ordering::Relaxed)
    }

    pub fn exposure_end_ignored(&self) -> u64 {
        self.exposure_end_ignored.load(Ordering::Relaxed)
    }

    /// Setup requests started by the frame-delivered fallback
    pub fn frame_delivered_accepted(&self) -> u64 {
        self.frame_delivered_accepted.load(Ordering::Relaxed)
    }

    pub fn frame_delivered_ignored(&self) -> u64 {
        self.frame_delivered_ignored.load(Ordering::Relaxed)
    }
}

/// Registered camera handlers
///
/// Handlers stay registered until this value is dropped.
pub struct EventSources {
    camera: Arc<dyn CameraSource>,
    mode: EventMode,
    counters: Arc<SourceCounters>,
}

impl EventSources {
    pub fn mode(&self) -> EventMode {
        self.mode
    }

    pub fn counters(&self) -> &SourceCounters {
        &self.counters
    }
}

impl Drop for EventSources {
    fn drop(&mut self) {
        self.camera.clear_handlers();
        debug!(mode = %self.mode, "event sources detached");
    }
}

/// Wire camera notifications to the synchronizer and the image signal
///
/// # Errors
/// `ContractError::Unsupported` if `mode` is `ExposureEnd` and the camera
/// cannot report exposure end.
pub fn attach_event_sources(
    camera: Arc<dyn CameraSource>,
    synchronizer: &SceneSynchronizer,
    image_signal: &Arc<ImageReceivedSignal>,
    mode: EventMode,
) -> Result<EventSources, ContractError> {
    let counters = Arc::new(SourceCounters::default());

    match mode {
        EventMode::ExposureEnd => {
            if !camera.supports_exposure_end() {
                return Err(ContractError::unsupported("EventExposureEnd"));
            }

            let synchronizer = synchronizer.clone();
            let counters = counters.clone();
            camera.on_exposure_end(Arc::new(move |n| {
                // Exposure is over but the image is still in transit:
                // start preparing the next frame now.
                let request = synchronizer.begin_setup(n.frame_id.next());
                counters.record_exposure_end(request);
                trace!(frame_id = %n.frame_id, ?request, "exposure end");
            }));
        }
        EventMode::FrameDelivered => {}
    }

    {
        let synchronizer = synchronizer.clone();
        let image_signal = image_signal.clone();
        let counters = counters.clone();
        camera.on_frame_delivered(Arc::new(move |n| {
            image_signal.notify();

            // Ignored when exposure end already requested this frame
            let request = synchronizer.begin_setup(n.frame_id.next());
            counters.record_frame_delivered(request);
            trace!(frame_id = %n.frame_id, ?request, "frame delivered");
        }));
    }

    debug!(mode = %mode, "event sources attached");

    Ok(EventSources {
        camera,
        mode,
        counters,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{
        ExposureEndCallback, ExposureEndNotification, FrameDeliveredCallback,
        FrameDeliveredNotification, FrameId, SceneSyncConfig,
    };
    use std::sync::Mutex;
    use sync_engine::ManualTimerScheduler;

    /// Camera whose notifications are raised by hand
    #[derive(Default)]
    struct ScriptedCamera {
        exposure_end_supported: bool,
        exposure_end: Mutex<Option<ExposureEndCallback>>,
        frame_delivered: Mutex<Option<FrameDeliveredCallback>>,
    }

    impl ScriptedCamera {
        fn exposure_end(&self, frame: u64) {
            let handler = self.exposure_end.lock().unwrap().clone();
            if let Some(handler) = handler {
                handler(ExposureEndNotification {
                    frame_id: FrameId(frame),
                });
            }
        }

        fn frame_delivered(&self, frame: u64) {
            let handler = self.frame_delivered.lock().unwrap().clone();
            if let Some(handler) = handler {
                handler(FrameDeliveredNotification {
                    frame_id: FrameId(frame),
                });
            }
        }
    }

    impl CameraSource for ScriptedCamera {
        fn supports_exposure_end(&self) -> bool {
            self.exposure_end_supported
        }

        fn on_exposure_end(&self, callback: ExposureEndCallback) {
            *self.exposure_end.lock().unwrap() = Some(callback);
        }

        fn on_frame_delivered(&self, callback: FrameDeliveredCallback) {
            *self.frame_delivered.lock().unwrap() = Some(callback);
        }

        fn clear_handlers(&self) {
            *self.exposure_end.lock().unwrap() = None;
            *self.frame_delivered.lock().unwrap() = None;
        }
    }

    fn setup() -> (
        Arc<ScriptedCamera>,
        SceneSynchronizer,
        Arc<ManualTimerScheduler>,
        Arc<ImageReceivedSignal>,
    ) {
        let camera = Arc::new(ScriptedCamera {
            exposure_end_supported: true,
            ..Default::default()
        });
        let scheduler = Arc::new(ManualTimerScheduler::new());
        let sync = SceneSynchronizer::with_scheduler(SceneSyncConfig::default(), scheduler.clone());
        let signal = Arc::new(ImageReceivedSignal::new(false));
        (camera, sync, scheduler, signal)
    }

    #[test]
    fn test_exposure_end_wins_and_fallback_is_ignored() {
        let (camera, sync, scheduler, signal) = setup();
        let sources =
            attach_event_sources(camera.clone(), &sync, &signal, EventMode::ExposureEnd).unwrap();

        camera.exposure_end(0);
        assert_eq!(sync.highest_requested(), Some(FrameId(1)));
        assert!(!signal.is_set());

        camera.frame_delivered(0);
        assert!(signal.is_set());
        assert_eq!(scheduler.scheduled(), 1);

        assert_eq!(sources.counters().exposure_end_accepted(), 1);
        assert_eq!(sources.counters().frame_delivered_ignored(), 1);
        assert_eq!(sources.counters().frame_delivered_accepted(), 0);
    }

    #[test]
    fn test_frame_delivered_mode_ignores_exposure_end() {
        let (camera, sync, scheduler, signal) = setup();
        let sources =
            attach_event_sources(camera.clone(), &sync, &signal, EventMode::FrameDelivered)
                .unwrap();

        camera.exposure_end(0);
        assert_eq!(sync.highest_requested(), None);

        camera.frame_delivered(0);
        assert_eq!(sync.highest_requested(), Some(FrameId(1)));
        assert_eq!(scheduler.scheduled(), 1);
        assert_eq!(sources.counters().frame_delivered_accepted(), 1);
    }

    #[test]
    fn test_unsupported_exposure_end() {
        let camera = Arc::new(ScriptedCamera::default());
        let sync = SceneSynchronizer::new(SceneSyncConfig::default());
        let signal = Arc::new(ImageReceivedSignal::default());

        let result = attach_event_sources(camera, &sync, &signal, EventMode::ExposureEnd);
        assert!(matches!(result, Err(ContractError::Unsupported { .. })));
    }

    #[test]
    fn test_drop_detaches_handlers() {
        let (camera, sync, _scheduler, signal) = setup();
        let sources =
            attach_event_sources(camera.clone(), &sync, &signal, EventMode::ExposureEnd).unwrap();
        drop(sources);

        camera.exposure_end(3);
        camera.frame_delivered(3);
        assert_eq!(sync.highest_requested(), None);
        assert!(!signal.is_set());
    }
}
