//! Time as an injected capability.
//!
//! The throttler and the circuit breaker both make decisions from elapsed
//! time. They take a [`Clock`] at construction instead of calling
//! [`Instant::now`] directly, so tests can drive time deterministically
//! without sleeping.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// A source of the current instant.
pub type Clock = Arc<dyn Fn() -> Instant + Send + Sync>;

/// The default clock, backed by [`Instant::now`].
pub fn system_clock() -> Clock {
    Arc::new(Instant::now)
}

/// A deterministic clock for tests.
///
/// Every observation through the closure returned by [`ManualClock::clock`]
/// first advances time by `tick`, so code that samples the clock sees it move
/// without any real waiting. [`ManualClock::advance`] jumps time explicitly;
/// construct with a zero tick when only explicit jumps are wanted.
#[derive(Clone)]
pub struct ManualClock {
    current: Arc<Mutex<Instant>>,
    tick: Duration,
}

impl ManualClock {
    pub fn new(tick: Duration) -> Self {
        Self {
            current: Arc::new(Mutex::new(Instant::now())),
            tick,
        }
    }

    /// Returns a [`Clock`] that advances by the configured tick on every
    /// observation.
    pub fn clock(&self) -> Clock {
        let current = Arc::clone(&self.current);
        let tick = self.tick;
        Arc::new(move || {
            let mut now = current.lock().unwrap();
            *now += tick;
            *now
        })
    }

    /// Advances the clock by `d` without observing it.
    pub fn advance(&self, d: Duration) {
        *self.current.lock().unwrap() += d;
    }
}
