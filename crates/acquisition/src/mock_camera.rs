//! Mock trigger-mode camera
//!
//! Implements `TriggerCommand` and `CameraSource` without hardware.
//! Every software trigger produces one frame:
//!
//! 1. the sensor exposes for `exposure_us`
//! 2. an exposure-end event is raised on the event thread (if enabled)
//! 3. the image is transmitted for `transmission_ms`
//! 4. a frame-delivered notification is raised on the stream thread
//!
//! Device frame numbers start at 0 and increase by one per trigger.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use async_channel::{Receiver, Sender};
use contracts::{
    CameraConfig, CameraSource, ContractError, ExposureEndCallback, ExposureEndNotification,
    FrameDeliveredCallback, FrameDeliveredNotification, FrameId, TriggerCommand,
};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, trace, warn};

/// Device activity counters
#[derive(Debug, Default)]
pub struct CameraCounters {
    triggers: AtomicU64,
    exposure_events: AtomicU64,
    frames_delivered: AtomicU64,
}

impl CameraCounters {
    /// Software triggers accepted
    pub fn triggers(&self) -> u64 {
        self.triggers.load(Ordering::Relaxed)
    }

    /// Exposure-end events raised
    pub fn exposure_events(&self) -> u64 {
        self.exposure_events.load(Ordering::Relaxed)
    }

    /// Frames fully delivered
    pub fn frames_delivered(&self) -> u64 {
        self.frames_delivered.load(Ordering::Relaxed)
    }
}

#[derive(Default)]
struct Handlers {
    exposure_end: RwLock<Option<ExposureEndCallback>>,
    frame_delivered: RwLock<Option<FrameDeliveredCallback>>,
}

/// Mock camera
///
/// Frames are produced on a background stream thread; exposure-end events
/// are delivered on a separate event thread, so both notifications can race
/// like they do on a real GigE/USB3 device.
pub struct MockCamera {
    config: CameraConfig,
    handlers: Arc<Handlers>,
    counters: Arc<CameraCounters>,
    trigger_tx: Sender<()>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl MockCamera {
    /// Create and start a mock camera
    pub fn new(config: CameraConfig) -> Self {
        let handlers = Arc::new(Handlers::default());
        let counters = Arc::new(CameraCounters::default());
        let (trigger_tx, trigger_rx) = async_channel::unbounded::<()>();
        let (event_tx, event_rx) = async_channel::unbounded::<ExposureEndNotification>();

        let stream = {
            let config = config.clone();
            let handlers = handlers.clone();
            let counters = counters.clone();
            thread::Builder::new()
                .name("mock-camera-stream".into())
                .spawn(move || Self::stream_loop(config, trigger_rx, event_tx, handlers, counters))
        };

        let events = {
            let handlers = handlers.clone();
            thread::Builder::new()
                .name("mock-camera-events".into())
                .spawn(move || Self::event_loop(event_rx, handlers))
        };

        let workers = [stream, events]
            .into_iter()
            .filter_map(|spawned| match spawned {
                Ok(handle) => Some(handle),
                Err(e) => {
                    warn!(error = %e, "failed to spawn mock camera thread");
                    None
                }
            })
            .collect();

        debug!(
            exposure_us = config.exposure_us,
            transmission_ms = config.transmission_ms,
            exposure_end_events = config.exposure_end_events,
            "mock camera started"
        );

        Self {
            config,
            handlers,
            counters,
            trigger_tx,
            workers: Mutex::new(workers),
        }
    }

    /// Create a mock camera with default timing
    pub fn with_defaults() -> Self {
        Self::new(CameraConfig::default())
    }

    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    pub fn counters(&self) -> &CameraCounters {
        &self.counters
    }

    /// Stop accepting triggers, finish queued frames and join device threads
    pub fn stop(&self) {
        self.trigger_tx.close();

        let workers: Vec<_> = self.workers.lock().drain(..).collect();
        for handle in workers {
            if handle.join().is_err() {
                warn!("mock camera thread panicked");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        !self.trigger_tx.is_closed()
    }

    fn stream_loop(
        config: CameraConfig,
        triggers: Receiver<()>,
        events: Sender<ExposureEndNotification>,
        handlers: Arc<Handlers>,
        counters: Arc<CameraCounters>,
    ) {
        let mut frame_id = FrameId::FIRST;

        while triggers.recv_blocking().is_ok() {
            thread::sleep(config.exposure());

            if config.exposure_end_events && handlers.exposure_end.read().is_some() {
                counters.exposure_events.fetch_add(1, Ordering::Relaxed);
                // Event thread gone means the camera is shutting down
                let _ = events.send_blocking(ExposureEndNotification { frame_id });
            }

            thread::sleep(config.transmission());

            counters.frames_delivered.fetch_add(1, Ordering::Relaxed);
            let handler = handlers.frame_delivered.read().clone();
            if let Some(handler) = handler {
                handler(FrameDeliveredNotification { frame_id });
            }

            trace!(frame_id = %frame_id, "mock frame delivered");
            frame_id = frame_id.next();
        }

        events.close();
        debug!(frames = frame_id.get(), "mock camera stream stopped");
    }

    fn event_loop(events: Receiver<ExposureEndNotification>, handlers: Arc<Handlers>) {
        while let Ok(notification) = events.recv_blocking() {
            let handler = handlers.exposure_end.read().clone();
            if let Some(handler) = handler {
                handler(notification);
            }
        }
    }
}

impl TriggerCommand for MockCamera {
    fn trigger(&self) -> Result<(), ContractError> {
        self.trigger_tx
            .try_send(())
            .map_err(|_| ContractError::device_stopped("mock camera is stopped"))?;
        self.counters.triggers.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

impl CameraSource for MockCamera {
    fn supports_exposure_end(&self) -> bool {
        self.config.exposure_end_events
    }

    fn on_exposure_end(&self, callback: ExposureEndCallback) {
        *self.handlers.exposure_end.write() = Some(callback);
    }

    fn on_frame_delivered(&self, callback: FrameDeliveredCallback) {
        *self.handlers.frame_delivered.write() = Some(callback);
    }

    fn clear_handlers(&self) {
        *self.handlers.exposure_end.write() = None;
        *self.handlers.frame_delivered.write() = None;
    }
}

impl Drop for MockCamera {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for MockCamera {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockCamera")
            .field("config", &self.config)
            .field("counters", &self.counters)
            .field("running", &self.is_running())
            .finish()
    }
}
