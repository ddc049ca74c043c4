/// Process-wide shutdown signal.
///
/// Cloned into every poller and the endpoint. Pollers sleep between ticks
/// with `wait_until`, which returns early as soon as the signal is tripped.

use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::Instant;

#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    fn flag(&self) -> MutexGuard<'_, bool> {
        self.inner.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Trips the signal and wakes every waiter. Idempotent.
    pub fn trigger(&self) {
        *self.flag() = true;
        self.inner.1.notify_all();
    }

    pub fn is_triggered(&self) -> bool {
        *self.flag()
    }

    /// Blocks until `deadline` or until the signal trips, whichever comes
    /// first. Returns `true` if shutdown was requested.
    ///
    /// A deadline already in the past returns immediately.
    pub fn wait_until(&self, deadline: Instant) -> bool {
        let mut triggered = self.flag();
        while !*triggered {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            let (guard, _) = self
                .inner
                .1
                .wait_timeout(triggered, deadline - now)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            triggered = guard;
        }
        true
    }

    /// Blocks until the signal trips.
    pub fn wait(&self) {
        let mut triggered = self.flag();
        while !*triggered {
            triggered = self
                .inner
                .1
                .wait(triggered)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
    }
}
