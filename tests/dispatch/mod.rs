//! Dispatcher integration tests.
//!
//! Test organization:
//! - basic.rs: every accepted document reaches the feeder
//! - ordering.rs: per-id submission order under parallel dispatch
//! - failures.rs: terminal failures, restart, breaker-open rejection
//! - concurrency.rs: budget saturation and larger interleavings

mod basic;
mod failures;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use docfeed_breaker::CircuitBreaker;
use docfeed_core::clock::ManualClock;
use docfeed_dispatch::{DocId, Dispatcher, Document, FeedResult, Feeder, OperationStatus};
use docfeed_throttler::DynamicThrottler;

/// Records every accepted document; fails every send once the accept budget
/// is exhausted.
pub(crate) struct RecordingFeeder {
    fail_after: Mutex<Option<usize>>,
    documents: Mutex<Vec<Document>>,
}

impl RecordingFeeder {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            fail_after: Mutex::new(None),
            documents: Mutex::new(Vec::new()),
        })
    }

    /// Accept `accepted` more documents in total, then fail every send.
    pub(crate) fn fail_after(&self, accepted: usize) {
        *self.fail_after.lock().unwrap() = Some(accepted);
    }

    pub(crate) fn clear_failures(&self) {
        *self.fail_after.lock().unwrap() = None;
    }

    pub(crate) fn documents(&self) -> Vec<Document> {
        self.documents.lock().unwrap().clone()
    }
}

#[async_trait]
impl Feeder for RecordingFeeder {
    async fn send(&self, document: Document) -> FeedResult {
        // Yield first so sends from different workers interleave.
        tokio::task::yield_now().await;
        let mut documents = self.documents.lock().unwrap();
        if let Some(budget) = *self.fail_after.lock().unwrap() {
            if documents.len() >= budget {
                return FeedResult::failure(document.id, OperationStatus::TransientFailure);
            }
        }
        documents.push(document.clone());
        FeedResult::success(document.id)
    }
}

/// A dispatcher wired the way production wires it, with a deterministic
/// throttler clock.
pub(crate) fn dispatcher(feeder: Arc<RecordingFeeder>) -> Dispatcher {
    let clock = ManualClock::new(Duration::from_secs(1));
    let throttler = DynamicThrottler::builder()
        .clock(clock.clock())
        .seed(42)
        .build();
    let breaker = CircuitBreaker::new(Duration::from_secs(1), Duration::ZERO);
    Dispatcher::new(feeder, Arc::new(throttler), Arc::new(breaker))
}

pub(crate) fn id(raw: &str) -> DocId {
    raw.parse().unwrap()
}
