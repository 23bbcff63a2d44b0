//! Events emitted by the throttler.

use std::time::Instant;

use docfeed_core::events::FeedEvent;

/// Events emitted by [`DynamicThrottler`](crate::DynamicThrottler).
#[derive(Debug, Clone)]
pub enum ThrottlerEvent {
    /// A measurement window closed and the dynamic target was revised.
    TargetUpdated {
        component: String,
        timestamp: Instant,
        previous: u64,
        target: u64,
    },
    /// The backend signalled overload at the given in-flight level.
    ThrottleSignaled {
        component: String,
        timestamp: Instant,
        inflight: u64,
    },
}

impl FeedEvent for ThrottlerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ThrottlerEvent::TargetUpdated { .. } => "target_updated",
            ThrottlerEvent::ThrottleSignaled { .. } => "throttle_signaled",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            ThrottlerEvent::TargetUpdated { timestamp, .. }
            | ThrottlerEvent::ThrottleSignaled { timestamp, .. } => *timestamp,
        }
    }

    fn component(&self) -> &str {
        match self {
            ThrottlerEvent::TargetUpdated { component, .. }
            | ThrottlerEvent::ThrottleSignaled { component, .. } => component,
        }
    }
}
