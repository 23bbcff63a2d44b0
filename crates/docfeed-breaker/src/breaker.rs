//! The breaker state machine.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::time::{Duration, Instant};

use docfeed_core::clock::Clock;
use docfeed_core::events::EventListeners;

use crate::config::CircuitBreakerBuilder;
use crate::events::BreakerEvent;

/// Health classification exposed by the circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum BreakerState {
    /// Healthy; keep sending.
    Closed = 0,
    /// Degraded; sending continues while the backend is probed.
    HalfOpen = 1,
    /// Unhealthy; shed load and fail fast.
    Open = 2,
}

impl BreakerState {
    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            1 => BreakerState::HalfOpen,
            2 => BreakerState::Open,
            _ => BreakerState::Closed,
        }
    }
}

/// Detects sustained backend unhealth from the time since the last success.
///
/// `success` and `failure` record observations; [`CircuitBreaker::state`]
/// classifies the current failing duration against the grace and doom
/// periods. All methods take `&self` and are safe to call from many workers.
pub struct CircuitBreaker {
    grace: Duration,
    doom: Option<Duration>,
    /// Construction instant; time is stored as nanoseconds since this base.
    epoch: Instant,
    last_success_nanos: AtomicU64,
    /// True once a failure has been observed after the last success.
    failing: AtomicBool,
    /// Last state reported, for edge-triggered transition events.
    observed: AtomicU8,
    clock: Clock,
    listeners: EventListeners<BreakerEvent>,
    name: String,
}

impl CircuitBreaker {
    /// Creates a breaker that reports HalfOpen after `grace` without a
    /// success and Open after `doom`. A zero `doom` disables the Open
    /// transition.
    pub fn new(grace: Duration, doom: Duration) -> Self {
        Self::builder().grace_period(grace).doom_period(doom).build()
    }

    /// Returns a builder for injecting a clock, a name, and event listeners.
    pub fn builder() -> CircuitBreakerBuilder {
        CircuitBreakerBuilder::default()
    }

    pub(crate) fn from_builder(builder: CircuitBreakerBuilder) -> Self {
        let epoch = (builder.clock)();
        Self {
            grace: builder.grace,
            doom: builder.doom.filter(|d| !d.is_zero()),
            epoch,
            last_success_nanos: AtomicU64::new(0),
            failing: AtomicBool::new(false),
            observed: AtomicU8::new(BreakerState::Closed as u8),
            clock: builder.clock,
            listeners: builder.listeners,
            name: builder.name,
        }
    }

    /// Records a successful operation; the breaker closes.
    pub fn success(&self) {
        let now = (self.clock)();
        self.last_success_nanos
            .store(self.nanos_since_epoch(now), Ordering::Relaxed);
        self.failing.store(false, Ordering::Relaxed);
        self.observe(BreakerState::Closed, now);
    }

    /// Records a failed operation.
    pub fn failure(&self) {
        self.failing.store(true, Ordering::Relaxed);
    }

    /// Classifies the current health.
    ///
    /// Closed while no failure has been seen since the last success, or while
    /// the failing duration is within the grace period; Open once the failing
    /// duration reaches the doom period (when one is configured); HalfOpen in
    /// between.
    pub fn state(&self) -> BreakerState {
        let now = (self.clock)();
        let state = if !self.failing.load(Ordering::Relaxed) {
            BreakerState::Closed
        } else {
            let last_success =
                Duration::from_nanos(self.last_success_nanos.load(Ordering::Relaxed));
            let failing_for = now.duration_since(self.epoch).saturating_sub(last_success);
            if failing_for < self.grace {
                BreakerState::Closed
            } else if self.doom.is_some_and(|doom| failing_for >= doom) {
                BreakerState::Open
            } else {
                BreakerState::HalfOpen
            }
        };
        self.observe(state, now);
        state
    }

    fn nanos_since_epoch(&self, now: Instant) -> u64 {
        now.duration_since(self.epoch).as_nanos() as u64
    }

    /// Publishes `state`, emitting a transition event on an edge.
    fn observe(&self, state: BreakerState, now: Instant) {
        let previous = BreakerState::from_u8(self.observed.swap(state as u8, Ordering::AcqRel));
        if previous == state {
            return;
        }

        #[cfg(feature = "tracing")]
        match state {
            BreakerState::HalfOpen => tracing::warn!(
                breaker = %self.name,
                "grace period expired without a success, circuit breaker half-open"
            ),
            BreakerState::Open => tracing::error!(
                breaker = %self.name,
                "doom period expired without a success, circuit breaker open"
            ),
            BreakerState::Closed => tracing::info!(breaker = %self.name, "circuit breaker closed"),
        }
        #[cfg(feature = "metrics")]
        {
            metrics::counter!("docfeed_breaker_transitions_total", "breaker" => self.name.clone())
                .increment(1);
            metrics::gauge!("docfeed_breaker_state", "breaker" => self.name.clone())
                .set(state as u8 as f64);
        }

        self.listeners.emit(&BreakerEvent::StateTransition {
            component: self.name.clone(),
            timestamp: now,
            from: previous,
            to: state,
        });
    }
}
