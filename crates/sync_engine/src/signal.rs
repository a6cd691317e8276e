//! Auto-reset "image received" event.

use std::time::Duration;

use contracts::WaitOutcome;
use parking_lot::{Condvar, Mutex};

/// Signals the pacing thread that the previous image has fully arrived
///
/// Starts set, because before the first trigger there is no image in flight.
/// A successful wait clears the signal again.
#[derive(Debug)]
pub struct ImageReceivedSignal {
    received: Mutex<bool>,
    cv: Condvar,
}

impl ImageReceivedSignal {
    pub fn new(initially_set: bool) -> Self {
        Self {
            received: Mutex::new(initially_set),
            cv: Condvar::new(),
        }
    }

    /// Mark an image as received and wake the waiter
    pub fn notify(&self) {
        *self.received.lock() = true;
        self.cv.notify_one();
    }

    /// Block until an image was received, then clear the signal
    pub fn wait(&self) {
        let mut received = self.received.lock();
        self.cv.wait_while(&mut received, |r| !*r);
        *received = false;
    }

    /// Bounded variant of [`wait`](Self::wait); clears nothing on timeout
    pub fn wait_timeout(&self, timeout: Duration) -> WaitOutcome {
        let mut received = self.received.lock();
        let _ = self.cv.wait_while_for(&mut received, |r| !*r, timeout);
        if *received {
            *received = false;
            WaitOutcome::Completed
        } else {
            WaitOutcome::TimedOut
        }
    }

    /// Force the signal state, e.g. set before a new run
    pub fn reset_to(&self, set: bool) {
        *self.received.lock() = set;
        if set {
            self.cv.notify_one();
        }
    }

    pub fn is_set(&self) -> bool {
        *self.received.lock()
    }
}

impl Default for ImageReceivedSignal {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn test_starts_set_and_auto_resets() {
        let signal = ImageReceivedSignal::default();
        assert!(signal.is_set());

        signal.wait();
        assert!(!signal.is_set());
        assert_eq!(
            signal.wait_timeout(Duration::from_millis(10)),
            WaitOutcome::TimedOut
        );
    }

    #[test]
    fn test_notify_wakes_waiter() {
        let signal = Arc::new(ImageReceivedSignal::new(false));

        let waiter = {
            let signal = signal.clone();
            thread::spawn(move || {
                let start = Instant::now();
                signal.wait();
                start.elapsed()
            })
        };

        thread::sleep(Duration::from_millis(20));
        signal.notify();

        let waited = waiter.join().unwrap();
        assert!(waited >= Duration::from_millis(15));
        assert!(!signal.is_set());
    }

    #[test]
    fn test_notifications_coalesce() {
        let signal = ImageReceivedSignal::new(false);
        signal.notify();
        signal.notify();

        assert!(signal.wait_timeout(Duration::from_millis(10)).is_completed());
        assert!(signal.wait_timeout(Duration::from_millis(10)).is_timed_out());
    }

    #[test]
    fn test_reset_to() {
        let signal = ImageReceivedSignal::new(false);
        signal.reset_to(true);
        assert!(signal.is_set());
        signal.reset_to(false);
        assert!(!signal.is_set());
    }
}
