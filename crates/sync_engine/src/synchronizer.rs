//! Scene setup synchronizer.
//!
//! Monitor (mutex + condvar) coordinating three parties:
//! - event sources requesting setup for an upcoming frame (`begin_setup`)
//! - the pacing thread waiting for setup to finish (`wait_completion`)
//! - the completion timer signalling that setup finished
//!
//! Per cycle: `Idle -> Pending` on an accepted request, `Pending -> Complete`
//! when the timer fires, `Complete -> Idle` when a waiter consumes the flag.

use std::fmt;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use contracts::{FrameId, SceneSyncConfig, SetupRequest, WaitOutcome};
use parking_lot::{Condvar, Mutex};
use tracing::{debug, instrument, trace};

use crate::timer::{CompletionTimer, ThreadTimerScheduler, TimerScheduler};

/// Counters describing synchronizer activity since creation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SynchronizerStats {
    /// `begin_setup` calls that started new setup work
    pub requests_accepted: u64,
    /// `begin_setup` calls suppressed as duplicate or stale
    pub requests_ignored: u64,
    /// Completion timers started
    pub timers_started: u64,
    /// Completion timers cancelled before firing
    pub timers_cancelled: u64,
    /// Timer fires that marked setup complete
    pub completions_signalled: u64,
    /// Completions consumed by a waiter
    pub completions_consumed: u64,
    /// Number of `reset` calls
    pub resets: u64,
}

/// Setup work currently in flight
struct PendingSetup {
    generation: u64,
    frame_id: FrameId,
    timer: CompletionTimer,
    requested_at: Instant,
}

struct SynchronizerState {
    /// Highest frame id accepted so far (None = nothing requested)
    highest_requested: Option<FrameId>,
    /// Setup finished and not yet consumed by a waiter
    setup_complete: bool,
    /// Some iff a request was accepted and its timer has neither fired nor been cancelled
    pending: Option<PendingSetup>,
    /// Tags timers so a late fire from a replaced timer is recognised
    next_generation: u64,
    /// Bumped by every `reset`; waiters blocked across a reset return without consuming
    reset_epoch: u64,
    stats: SynchronizerStats,
}

impl SynchronizerState {
    fn new() -> Self {
        Self {
            highest_requested: None,
            setup_complete: true,
            pending: None,
            next_generation: 0,
            reset_epoch: 0,
            stats: SynchronizerStats::default(),
        }
    }

    /// Consume an available completion
    ///
    /// A waiter that entered before a `reset` is released without consuming,
    /// so every thread blocked at reset time returns and the flag is still
    /// there for the next caller.
    fn finish_wait(&mut self, entered_epoch: u64) -> WaitOutcome {
        if self.reset_epoch != entered_epoch {
            return WaitOutcome::Completed;
        }
        if self.setup_complete {
            self.setup_complete = false;
            self.stats.completions_consumed += 1;
            WaitOutcome::Completed
        } else {
            WaitOutcome::TimedOut
        }
    }

    /// Cancel the in-flight timer, if any
    fn cancel_pending(&mut self) -> Option<FrameId> {
        let pending = self.pending.take()?;
        if pending.timer.cancel() {
            self.stats.timers_cancelled += 1;
            observability::record_timer_cancelled();
        }
        Some(pending.frame_id)
    }
}

struct Inner {
    setup_delay: Duration,
    scheduler: Arc<dyn TimerScheduler>,
    state: Mutex<SynchronizerState>,
    completed: Condvar,
}

impl Inner {
    /// Timer callback for the request tagged `generation`
    fn on_timer_fired(&self, generation: u64) {
        let mut state = self.state.lock();

        let is_current = state
            .pending
            .as_ref()
            .is_some_and(|p| p.generation == generation);
        if !is_current {
            trace!(generation, "stale setup timer ignored");
            return;
        }

        if let Some(pending) = state.pending.take() {
            let latency = pending.requested_at.elapsed();
            state.setup_complete = true;
            state.stats.completions_signalled += 1;

            debug!(
                frame_id = %pending.frame_id,
                latency_ms = latency.as_secs_f64() * 1000.0,
                "scene setup complete"
            );
            observability::record_setup_completed(latency.as_secs_f64() * 1000.0);
        }

        self.completed.notify_all();
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(pending) = self.state.get_mut().pending.take() {
            pending.timer.cancel();
        }
    }
}

/// Overlaps scene setup with image acquisition
///
/// Cloning yields another handle to the same synchronizer; hand one to every
/// thread that requests or awaits setup.
///
/// # Example
///
/// ```ignore
/// let sync = SceneSynchronizer::new(SceneSyncConfig::default());
///
/// // event thread
/// sync.begin_setup(FrameId(1));
///
/// // pacing thread
/// sync.wait_completion();
/// camera.trigger()?;
/// ```
#[derive(Clone)]
pub struct SceneSynchronizer {
    inner: Arc<Inner>,
}

impl SceneSynchronizer {
    /// Create a synchronizer whose timers run on background threads
    pub fn new(config: SceneSyncConfig) -> Self {
        Self::with_scheduler(config, Arc::new(ThreadTimerScheduler))
    }

    /// Create a synchronizer backed by a custom timer scheduler
    pub fn with_scheduler(config: SceneSyncConfig, scheduler: Arc<dyn TimerScheduler>) -> Self {
        Self {
            inner: Arc::new(Inner {
                setup_delay: config.setup_delay(),
                scheduler,
                state: Mutex::new(SynchronizerState::new()),
                completed: Condvar::new(),
            }),
        }
    }

    /// Configured scene setup latency
    pub fn setup_delay(&self) -> Duration {
        self.inner.setup_delay
    }

    /// Request scene setup for `frame_id`
    ///
    /// Starts new setup work only if `frame_id` is above every id requested
    /// since creation or the last `reset`; otherwise does nothing. A request
    /// accepted while another is in flight replaces it.
    #[instrument(
        level = "trace",
        name = "scene_sync_begin_setup",
        skip(self, frame_id),
        fields(frame_id = %frame_id)
    )]
    pub fn begin_setup(&self, frame_id: FrameId) -> SetupRequest {
        let mut state = self.inner.state.lock();

        if Some(frame_id) <= state.highest_requested {
            state.stats.requests_ignored += 1;
            observability::record_setup_request(false);
            trace!(
                highest = ?state.highest_requested.map(FrameId::get),
                "setup already requested, ignoring"
            );
            return SetupRequest::Ignored;
        }

        if let Some(replaced) = state.cancel_pending() {
            debug!(replaced = %replaced, "replacing in-flight scene setup");
        }

        state.highest_requested = Some(frame_id);
        state.setup_complete = false;

        let generation = state.next_generation;
        state.next_generation += 1;

        // Weak: a pending timer must not keep the synchronizer alive
        let inner: Weak<Inner> = Arc::downgrade(&self.inner);
        let timer = self.inner.scheduler.schedule(
            self.inner.setup_delay,
            Box::new(move || {
                if let Some(inner) = inner.upgrade() {
                    inner.on_timer_fired(generation);
                }
            }),
        );

        state.pending = Some(PendingSetup {
            generation,
            frame_id,
            timer,
            requested_at: Instant::now(),
        });
        state.stats.requests_accepted += 1;
        state.stats.timers_started += 1;
        observability::record_setup_request(true);

        debug!(
            delay_ms = self.inner.setup_delay.as_millis() as u64,
            "scene setup started"
        );

        SetupRequest::Accepted
    }

    /// Block until scene setup is complete, then consume the completion
    ///
    /// Each completion satisfies exactly one call; a second call blocks until
    /// the next accepted request completes. A `reset` releases every blocked
    /// caller.
    #[instrument(level = "trace", name = "scene_sync_wait_completion", skip(self))]
    pub fn wait_completion(&self) {
        let mut state = self.inner.state.lock();
        let epoch = state.reset_epoch;
        self.inner
            .completed
            .wait_while(&mut state, |s| !s.setup_complete && s.reset_epoch == epoch);

        let _ = state.finish_wait(epoch);
    }

    /// Like [`wait_completion`](Self::wait_completion) but gives up after `timeout`
    ///
    /// On `TimedOut` nothing is consumed.
    #[instrument(level = "trace", name = "scene_sync_wait_completion_timeout", skip(self))]
    pub fn wait_completion_timeout(&self, timeout: Duration) -> WaitOutcome {
        let mut state = self.inner.state.lock();
        let epoch = state.reset_epoch;
        let _ = self.inner.completed.wait_while_for(
            &mut state,
            |s| !s.setup_complete && s.reset_epoch == epoch,
            timeout,
        );

        state.finish_wait(epoch)
    }

    /// Return to the initial state
    ///
    /// Cancels in-flight setup, forgets requested frame ids and marks setup
    /// complete, so the next `wait_completion` returns immediately. All
    /// threads blocked in `wait_completion` are released.
    #[instrument(level = "debug", name = "scene_sync_reset", skip(self))]
    pub fn reset(&self) {
        let mut state = self.inner.state.lock();

        if let Some(cancelled) = state.cancel_pending() {
            debug!(frame_id = %cancelled, "in-flight scene setup cancelled by reset");
        }

        state.highest_requested = None;
        state.setup_complete = true;
        state.reset_epoch += 1;
        state.stats.resets += 1;

        self.inner.completed.notify_all();
    }

    /// Whether a completion is available to be consumed
    pub fn is_complete(&self) -> bool {
        self.inner.state.lock().setup_complete
    }

    /// Highest frame id requested since creation or the last reset
    pub fn highest_requested(&self) -> Option<FrameId> {
        self.inner.state.lock().highest_requested
    }

    /// Frame whose setup is currently in flight
    pub fn pending_frame(&self) -> Option<FrameId> {
        self.inner.state.lock().pending.as_ref().map(|p| p.frame_id)
    }

    pub fn stats(&self) -> SynchronizerStats {
        self.inner.state.lock().stats
    }
}

impl fmt::Debug for SceneSynchronizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("SceneSynchronizer")
            .field("setup_delay", &self.inner.setup_delay)
            .field("highest_requested", &state.highest_requested)
            .field("setup_complete", &state.setup_complete)
            .field("pending_frame", &state.pending.as_ref().map(|p| p.frame_id))
            .finish()
    }
}
