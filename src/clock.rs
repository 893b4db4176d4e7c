//! Time sources for the temporal state.
//!
//! All timers of the controller are plain `f64` seconds read from a [Clock]. Injecting the
//! clock keeps the state machines deterministic under test.

use std::sync::{Arc, Mutex};

/// A monotonic time source, in seconds.
pub trait Clock: Send + Sync {
    /// Current time in seconds.
    fn now(&self) -> f64;
}

/// Monotonic clock based on the tokio time driver.
///
/// Under `tokio::time::pause` it advances together with the paused runtime clock.
#[derive(Clone, Debug)]
pub struct TokioClock {
    origin: tokio::time::Instant,
}

impl TokioClock {
    /// Create a clock which reads zero now.
    pub fn new() -> Self {
        Self {
            origin: tokio::time::Instant::now(),
        }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TokioClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// A manually driven clock. Clones share the same time.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    time: Arc<Mutex<f64>>,
}

impl ManualClock {
    /// Create a clock starting at `time`.
    pub fn starting_at(time: f64) -> Self {
        Self {
            time: Arc::new(Mutex::new(time)),
        }
    }

    /// Set the current time.
    pub fn set(&self, time: f64) {
        *self.lock() = time;
    }

    /// Advance the current time by `dt` seconds.
    pub fn advance(&self, dt: f64) {
        *self.lock() += dt;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, f64> {
        // a poisoned lock still holds a valid f64
        self.time.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        *self.lock()
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> f64 {
        (**self).now()
    }
}
