//! Dispatcher errors.

use thiserror::Error;

use crate::document::DocId;

/// Errors surfaced by [`Dispatcher`](crate::Dispatcher).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// The dispatcher has been closed; the operation was not accepted.
    #[error("dispatcher is closed")]
    Closed,

    /// The circuit breaker is open; the operation was rejected and counted
    /// as a failure.
    #[error("refusing to dispatch document {0}: circuit breaker is open")]
    CircuitOpen(DocId),
}
