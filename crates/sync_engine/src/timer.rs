//! One-shot, cancellable completion timers.
//!
//! A timer is split into two halves:
//! - [`CompletionTimer`]: the owner's handle, used to cancel
//! - [`TimerFuse`]: the scheduler's half, used to wait out the delay and fire
//!
//! Firing and cancelling race on a single atomic transition out of
//! `PENDING`, so exactly one of them wins.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::trace;

const PENDING: u8 = 0;
const FIRED: u8 = 1;
const CANCELLED: u8 = 2;

static NEXT_TIMER_ID: AtomicU64 = AtomicU64::new(1);

/// Callback invoked when a timer fires
pub type TimerCallback = Box<dyn FnOnce() + Send + 'static>;

#[derive(Debug)]
struct TimerShared {
    id: u64,
    state: AtomicU8,
    /// Set on cancel so a sleeping fuse wakes up early
    cancelled: Mutex<bool>,
    wake: Condvar,
}

/// Owner handle of a scheduled timer
#[derive(Debug)]
pub struct CompletionTimer {
    shared: Arc<TimerShared>,
}

/// Scheduler half of a timer
#[derive(Debug)]
pub struct TimerFuse {
    shared: Arc<TimerShared>,
}

impl CompletionTimer {
    /// Create a pending timer and its fuse
    pub fn pair() -> (CompletionTimer, TimerFuse) {
        let shared = Arc::new(TimerShared {
            id: NEXT_TIMER_ID.fetch_add(1, Ordering::Relaxed),
            state: AtomicU8::new(PENDING),
            cancelled: Mutex::new(false),
            wake: Condvar::new(),
        });
        (
            CompletionTimer {
                shared: shared.clone(),
            },
            TimerFuse { shared },
        )
    }

    /// Process-unique timer id
    pub fn id(&self) -> u64 {
        self.shared.id
    }

    /// Cancel the timer
    ///
    /// Returns `true` if this call prevented the callback from running,
    /// `false` if the timer had already fired or been cancelled.
    pub fn cancel(&self) -> bool {
        let won = self
            .shared
            .state
            .compare_exchange(PENDING, CANCELLED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();

        if won {
            *self.shared.cancelled.lock() = true;
            self.shared.wake.notify_all();
            trace!(timer_id = self.shared.id, "completion timer cancelled");
        }

        won
    }

    pub fn is_pending(&self) -> bool {
        self.shared.state.load(Ordering::Acquire) == PENDING
    }

    pub fn is_fired(&self) -> bool {
        self.shared.state.load(Ordering::Acquire) == FIRED
    }

    pub fn is_cancelled(&self) -> bool {
        self.shared.state.load(Ordering::Acquire) == CANCELLED
    }
}

impl TimerFuse {
    pub fn id(&self) -> u64 {
        self.shared.id
    }

    /// Block until `delay` has elapsed or the timer was cancelled
    ///
    /// Returns `true` if the full delay elapsed without cancellation.
    pub fn sleep(&self, delay: Duration) -> bool {
        let deadline = Instant::now() + delay;
        let mut cancelled = self.shared.cancelled.lock();
        while !*cancelled {
            if self
                .shared
                .wake
                .wait_until(&mut cancelled, deadline)
                .timed_out()
            {
                break;
            }
        }
        !*cancelled
    }

    /// Run `callback` unless the timer was cancelled first
    ///
    /// Returns `true` if the callback ran.
    pub fn fire(self, callback: TimerCallback) -> bool {
        let won = self
            .shared
            .state
            .compare_exchange(PENDING, FIRED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();

        if won {
            trace!(timer_id = self.shared.id, "completion timer fired");
            callback();
        }

        won
    }
}

/// Deferred-execution backend for completion timers
///
/// Implementations must never invoke the callback from inside `schedule`;
/// the synchronizer schedules while holding its lock.
pub trait TimerScheduler: Send + Sync {
    /// Run `callback` once after `delay` unless the returned timer is cancelled
    fn schedule(&self, delay: Duration, callback: TimerCallback) -> CompletionTimer;
}

/// Runs each timer on its own short-lived thread
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadTimerScheduler;

impl TimerScheduler for ThreadTimerScheduler {
    fn schedule(&self, delay: Duration, callback: TimerCallback) -> CompletionTimer {
        let (timer, fuse) = CompletionTimer::pair();

        thread::spawn(move || {
            if fuse.sleep(delay) {
                fuse.fire(callback);
            }
        });

        timer
    }
}

struct ManualTimer {
    delay: Duration,
    fuse: Option<TimerFuse>,
    callback: Option<TimerCallback>,
}

/// Scheduler whose timers only fire when told to
///
/// Lets callers drive completion deterministically, e.g. to reproduce a
/// fire racing a cancel.
#[derive(Default)]
pub struct ManualTimerScheduler {
    timers: Mutex<Vec<ManualTimer>>,
}

impl ManualTimerScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of timers scheduled so far
    pub fn scheduled(&self) -> usize {
        self.timers.lock().len()
    }

    /// Delay requested for the `index`-th scheduled timer
    pub fn delay_of(&self, index: usize) -> Option<Duration> {
        self.timers.lock().get(index).map(|t| t.delay)
    }

    /// Fire the `index`-th scheduled timer
    ///
    /// Returns `true` if its callback ran. A timer fires at most once.
    pub fn fire(&self, index: usize) -> bool {
        let (fuse, callback) = {
            let mut timers = self.timers.lock();
            match timers.get_mut(index) {
                Some(timer) => (timer.fuse.take(), timer.callback.take()),
                None => return false,
            }
        };

        match (fuse, callback) {
            (Some(fuse), Some(callback)) => fuse.fire(callback),
            _ => false,
        }
    }

    /// Fire the most recently scheduled timer
    pub fn fire_latest(&self) -> bool {
        match self.scheduled().checked_sub(1) {
            Some(index) => self.fire(index),
            None => false,
        }
    }
}

impl TimerScheduler for ManualTimerScheduler {
    fn schedule(&self, delay: Duration, callback: TimerCallback) -> CompletionTimer {
        let (timer, fuse) = CompletionTimer::pair();
        self.timers.lock().push(ManualTimer {
            delay,
            fuse: Some(fuse),
            callback: Some(callback),
        });
        timer
    }
}
