//! Events emitted by the circuit breaker.

use std::time::Instant;

use docfeed_core::events::FeedEvent;

use crate::breaker::BreakerState;

/// Events emitted by [`CircuitBreaker`](crate::CircuitBreaker).
#[derive(Debug, Clone)]
pub enum BreakerEvent {
    /// The observed state changed.
    StateTransition {
        component: String,
        timestamp: Instant,
        from: BreakerState,
        to: BreakerState,
    },
}

impl FeedEvent for BreakerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            BreakerEvent::StateTransition { .. } => "state_transition",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            BreakerEvent::StateTransition { timestamp, .. } => *timestamp,
        }
    }

    fn component(&self) -> &str {
        match self {
            BreakerEvent::StateTransition { component, .. } => component,
        }
    }
}
