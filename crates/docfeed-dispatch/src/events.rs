//! Events emitted by the dispatcher.

use std::time::Instant;

use docfeed_core::events::FeedEvent;

use crate::document::DocId;
use crate::feeder::OperationStatus;

/// Events emitted by [`Dispatcher`](crate::Dispatcher).
#[derive(Debug, Clone)]
pub enum DispatchEvent {
    /// A feed result was folded into the statistics.
    OperationCompleted {
        component: String,
        timestamp: Instant,
        id: DocId,
        status: OperationStatus,
    },
    /// An operation was rejected because the circuit breaker was open.
    OperationRejected {
        component: String,
        timestamp: Instant,
        id: DocId,
    },
    /// Close drained the last in-flight operation.
    Drained {
        component: String,
        timestamp: Instant,
    },
}

impl FeedEvent for DispatchEvent {
    fn event_type(&self) -> &'static str {
        match self {
            DispatchEvent::OperationCompleted { .. } => "operation_completed",
            DispatchEvent::OperationRejected { .. } => "operation_rejected",
            DispatchEvent::Drained { .. } => "drained",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            DispatchEvent::OperationCompleted { timestamp, .. }
            | DispatchEvent::OperationRejected { timestamp, .. }
            | DispatchEvent::Drained { timestamp, .. } => *timestamp,
        }
    }

    fn component(&self) -> &str {
        match self {
            DispatchEvent::OperationCompleted { component, .. }
            | DispatchEvent::OperationRejected { component, .. }
            | DispatchEvent::Drained { component, .. } => component,
        }
    }
}
