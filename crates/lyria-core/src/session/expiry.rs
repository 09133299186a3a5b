//! Collapses bursts of expiry signals into one notification.
//!
//! A 401 on a send, a 401 on a history fetch and a failed background check
//! can all report the same expiry within milliseconds of each other. Only the
//! first one inside the window is allowed through.

use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug)]
pub struct ExpiryGuard {
    window: Duration,
    last_fired: Mutex<Option<Instant>>,
}

impl ExpiryGuard {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_fired: Mutex::new(None),
        }
    }

    /// Returns true if the caller should publish the expiry notice.
    pub fn try_fire(&self) -> bool {
        let mut last = self.last_fired.lock().expect("expiry guard lock poisoned");
        let now = Instant::now();
        match *last {
            Some(at) if now.duration_since(at) < self.window => false,
            _ => {
                *last = Some(now);
                true
            }
        }
    }

    /// Re-arm immediately (a new session was established).
    pub fn reset(&self) {
        *self.last_fired.lock().expect("expiry guard lock poisoned") = None;
    }
}
