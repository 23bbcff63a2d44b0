//! The feeding backend contract.

use async_trait::async_trait;

use crate::document::{DocId, Document};
use crate::stats::Stats;

/// Outcome classification of a single feed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OperationStatus {
    /// The operation was applied.
    Success,
    /// The backend rejected the operation with a retryable condition.
    TransientFailure,
    /// The backend rejected the operation permanently.
    PermanentFailure,
    /// The operation never reached the backend.
    TransportFailure,
    /// The backend asked the client to back off.
    Throttled,
}

impl OperationStatus {
    /// True iff the operation was applied.
    pub fn success(self) -> bool {
        matches!(self, OperationStatus::Success)
    }
}

/// Per-operation outcome reported by a [`Feeder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedResult {
    /// Echoes the id of the document that was sent.
    pub id: DocId,
    pub status: OperationStatus,
    /// Counters the dispatcher merges into its own statistics. Feeders set
    /// at least one operation per result and one error on a non-success
    /// result; the constructors below do.
    pub stats: Stats,
}

impl FeedResult {
    /// A successful result for `id`.
    pub fn success(id: DocId) -> Self {
        Self {
            id,
            status: OperationStatus::Success,
            stats: Stats {
                operations: 1,
                successes: 1,
                ..Stats::default()
            },
        }
    }

    /// A failed result for `id` with the given non-success status.
    pub fn failure(id: DocId, status: OperationStatus) -> Self {
        debug_assert!(!status.success());
        Self {
            id,
            status,
            stats: Stats {
                operations: 1,
                errors: 1,
                ..Stats::default()
            },
        }
    }

    /// Adds transferred byte counts to the result's stats.
    pub fn with_bytes(mut self, sent: u64, received: u64) -> Self {
        self.stats.bytes_sent += sent;
        self.stats.bytes_recv += received;
        self
    }
}

/// A feeding backend.
///
/// Transport, authentication, and request-level retries live behind this
/// seam; the dispatcher only sees the final outcome of each operation.
/// `send` is invoked from many workers concurrently for distinct documents,
/// never concurrently for the same document id.
#[async_trait]
pub trait Feeder: Send + Sync {
    async fn send(&self, document: Document) -> FeedResult;
}
