//! Configuration for the circuit breaker.

use std::time::Duration;

use docfeed_core::clock::{system_clock, Clock};
use docfeed_core::events::{EventListeners, FnListener};

use crate::breaker::{BreakerState, CircuitBreaker};
use crate::events::BreakerEvent;

/// Builder for [`CircuitBreaker`].
pub struct CircuitBreakerBuilder {
    pub(crate) grace: Duration,
    pub(crate) doom: Option<Duration>,
    pub(crate) clock: Clock,
    pub(crate) name: String,
    pub(crate) listeners: EventListeners<BreakerEvent>,
}

impl Default for CircuitBreakerBuilder {
    fn default() -> Self {
        Self {
            grace: Duration::from_secs(10),
            doom: None,
            clock: system_clock(),
            name: "breaker".to_string(),
            listeners: EventListeners::new(),
        }
    }
}

impl CircuitBreakerBuilder {
    /// Time without a success after which the breaker reports HalfOpen.
    pub fn grace_period(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Time without a success after which the breaker reports Open. Zero
    /// disables the Open transition.
    pub fn doom_period(mut self, doom: Duration) -> Self {
        self.doom = Some(doom);
        self
    }

    /// Sets the clock the breaker measures elapsed time with.
    pub fn clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Names this breaker instance in events, logs, and metrics labels.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Registers a callback for every state transition.
    pub fn on_state_transition<F>(mut self, f: F) -> Self
    where
        F: Fn(BreakerState, BreakerState) + Send + Sync + 'static,
    {
        self.listeners.add(FnListener::new(move |event: &BreakerEvent| {
            let BreakerEvent::StateTransition { from, to, .. } = event;
            f(*from, *to);
        }));
        self
    }

    pub fn build(self) -> CircuitBreaker {
        CircuitBreaker::from_builder(self)
    }
}
