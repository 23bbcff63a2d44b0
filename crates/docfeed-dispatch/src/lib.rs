//! Concurrent, order-preserving document dispatch.
//!
//! This crate is the core of docfeed: it accepts a stream of document
//! operations from a single producer, fans them out to a feeding backend at
//! an in-flight level chosen by the throttler, and preserves per-identifier
//! submission order while the circuit breaker guards against sustained
//! backend outages.
//!
//! ## Collaborators
//! - [`Feeder`]: the backend seam; transport, auth, and request-level
//!   retries live behind it
//! - [`docfeed_throttler::Throttler`]: recommends the in-flight budget
//! - [`docfeed_breaker::CircuitBreaker`]: classifies backend health
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use async_trait::async_trait;
//! use docfeed_breaker::CircuitBreaker;
//! use docfeed_dispatch::{Dispatcher, Document, FeedResult, Feeder};
//! use docfeed_throttler::DynamicThrottler;
//!
//! struct NullFeeder;
//!
//! #[async_trait]
//! impl Feeder for NullFeeder {
//!     async fn send(&self, document: Document) -> FeedResult {
//!         FeedResult::success(document.id)
//!     }
//! }
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let dispatcher = Dispatcher::new(
//!     Arc::new(NullFeeder),
//!     Arc::new(DynamicThrottler::new()),
//!     Arc::new(CircuitBreaker::new(Duration::from_secs(10), Duration::ZERO)),
//! );
//!
//! let id = "id:music:song::love-me-do".parse()?;
//! dispatcher
//!     .enqueue(Document::put(id, br#"{"fields":{"title":"Love Me Do"}}"#.to_vec()))
//!     .await?;
//! dispatcher.close().await;
//!
//! assert_eq!(dispatcher.stats().successes, 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Ordering
//!
//! Operations on the same [`DocId`] are applied strictly in the order the
//! producer enqueued them; at most one operation per id is in flight at any
//! moment. Operations on distinct ids are dispatched in parallel with no
//! ordering between them.
//!
//! ## Failure semantics
//!
//! A failed operation is terminal: it is counted in [`Stats::errors`] and
//! reported to the breaker, and the dispatcher moves on to the next
//! operation for that id. The dispatcher never retries.

pub mod dispatcher;
pub mod document;
pub mod error;
pub mod events;
pub mod feeder;
pub mod stats;

pub use dispatcher::{Dispatcher, DispatcherBuilder};
pub use document::{DocId, Document, Operation, ParseDocIdError};
pub use error::DispatchError;
pub use events::DispatchEvent;
pub use feeder::{FeedResult, Feeder, OperationStatus};
pub use stats::Stats;
