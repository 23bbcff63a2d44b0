//! The dispatch core: bounded fan-out with per-identifier ordering.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use docfeed_breaker::{BreakerState, CircuitBreaker};
use docfeed_core::events::{EventListeners, FnListener};
use docfeed_throttler::Throttler;
use tokio::sync::Notify;

use crate::document::{DocId, Document};
use crate::error::DispatchError;
use crate::events::DispatchEvent;
use crate::feeder::{Feeder, OperationStatus};
use crate::stats::Stats;

/// Concurrent, order-preserving document dispatcher.
///
/// A single producer enqueues documents; the dispatcher fans them out to one
/// worker task per active document id, bounded by the throttler's
/// recommended in-flight target. Operations on the same id are applied
/// strictly in submission order; operations on disjoint ids run in parallel.
/// Every result feeds the throttler and the circuit breaker and accumulates
/// into [`Stats`].
///
/// Failures are terminal for the failing document but never stall its id
/// group; subsequent operations for the same id proceed.
///
/// Clones are cheap and share the same dispatcher.
#[derive(Clone)]
pub struct Dispatcher {
    shared: Arc<Shared>,
}

struct Shared {
    feeder: Arc<dyn Feeder>,
    throttler: Arc<dyn Throttler>,
    breaker: Arc<CircuitBreaker>,
    /// Pending (not yet executing) operations per id. An entry exists iff a
    /// worker currently owns that id; the executing operation is held by the
    /// worker itself.
    groups: Mutex<HashMap<DocId, VecDeque<Document>>>,
    stats: Mutex<Stats>,
    /// Documents accepted and not yet folded into stats.
    inflight: AtomicU64,
    closed: AtomicBool,
    /// Woken when an in-flight slot frees up.
    capacity: Notify,
    /// Woken when the in-flight count or the group table may have drained.
    drained: Notify,
    listeners: EventListeners<DispatchEvent>,
    name: String,
}

impl Dispatcher {
    /// Constructs a running dispatcher on top of the given collaborators.
    pub fn new(
        feeder: Arc<dyn Feeder>,
        throttler: Arc<dyn Throttler>,
        breaker: Arc<CircuitBreaker>,
    ) -> Self {
        Self::builder(feeder, throttler, breaker).build()
    }

    /// Returns a builder for attaching a name and event listeners.
    pub fn builder(
        feeder: Arc<dyn Feeder>,
        throttler: Arc<dyn Throttler>,
        breaker: Arc<CircuitBreaker>,
    ) -> DispatcherBuilder {
        DispatcherBuilder {
            feeder,
            throttler,
            breaker,
            name: "dispatcher".to_string(),
            listeners: EventListeners::new(),
        }
    }

    /// Accepts a document for dispatch.
    ///
    /// Blocks while the in-flight budget is saturated. Fails with
    /// [`DispatchError::Closed`] after [`close`](Self::close) and with
    /// [`DispatchError::CircuitOpen`] while the breaker reports Open; the
    /// latter folds a synthetic failure into the statistics.
    pub async fn enqueue(&self, document: Document) -> Result<(), DispatchError> {
        let shared = &self.shared;
        if shared.closed.load(Ordering::Acquire) {
            return Err(DispatchError::Closed);
        }
        if shared.breaker.state() == BreakerState::Open {
            return Err(shared.reject(document.id));
        }
        shared.acquire_slot().await;

        #[cfg(feature = "tracing")]
        tracing::trace!(id = %document.id, operation = ?document.operation, "accepted document");

        let first = {
            let mut groups = shared.groups.lock().unwrap();
            match groups.entry(document.id.clone()) {
                Entry::Occupied(mut group) => {
                    // A worker already owns this id and will pick the
                    // document up in order.
                    group.get_mut().push_back(document);
                    None
                }
                Entry::Vacant(slot) => {
                    slot.insert(VecDeque::new());
                    Some(document)
                }
            }
        };
        if let Some(document) = first {
            let worker = Arc::clone(shared);
            tokio::spawn(async move { worker.run_group(document).await });
        }
        Ok(())
    }

    /// Quiesces the dispatcher: rejects further enqueues and waits until
    /// every already-accepted document has completed and every id group has
    /// retired.
    pub async fn close(&self) {
        let shared = &self.shared;
        shared.closed.store(true, Ordering::Release);
        loop {
            if shared.is_drained() {
                break;
            }
            let drained = shared.drained.notified();
            if shared.is_drained() {
                break;
            }
            drained.await;
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(dispatcher = %shared.name, "dispatcher drained");

        shared.listeners.emit(&DispatchEvent::Drained {
            component: shared.name.clone(),
            timestamp: Instant::now(),
        });
    }

    /// Transitions a closed dispatcher back to running.
    ///
    /// Accumulated statistics are preserved; the throttler and the breaker
    /// keep their history.
    pub fn start(&self) {
        self.shared.closed.store(false, Ordering::Release);
    }

    /// A snapshot of the counters accumulated so far.
    pub fn stats(&self) -> Stats {
        *self.shared.stats.lock().unwrap()
    }

    /// The number of documents currently accepted and not yet completed.
    pub fn inflight(&self) -> u64 {
        self.shared.inflight.load(Ordering::Relaxed)
    }
}

impl Shared {
    /// Waits for room in the in-flight budget and claims one slot.
    ///
    /// The budget is re-read from the throttler on every attempt, so a
    /// shrinking target simply stops admissions until enough in-flight
    /// operations drain; excess slots are never force-reclaimed.
    async fn acquire_slot(&self) {
        loop {
            if self.try_acquire_slot() {
                return;
            }
            let capacity = self.capacity.notified();
            if self.try_acquire_slot() {
                return;
            }
            capacity.await;
        }
    }

    fn try_acquire_slot(&self) -> bool {
        let target = self.throttler.target_inflight();
        let mut current = self.inflight.load(Ordering::Relaxed);
        while current < target {
            match self.inflight.compare_exchange_weak(
                current,
                current + 1,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => {
                    #[cfg(feature = "metrics")]
                    metrics::gauge!("docfeed_inflight", "dispatcher" => self.name.clone())
                        .set((current + 1) as f64);
                    return true;
                }
                Err(observed) => current = observed,
            }
        }
        false
    }

    fn release_slot(&self) {
        #[cfg(feature = "metrics")]
        {
            let remaining = self.inflight.fetch_sub(1, Ordering::AcqRel) - 1;
            metrics::gauge!("docfeed_inflight", "dispatcher" => self.name.clone())
                .set(remaining as f64);
        }
        #[cfg(not(feature = "metrics"))]
        self.inflight.fetch_sub(1, Ordering::AcqRel);

        self.capacity.notify_one();
        self.drained.notify_waiters();
    }

    /// Processes one id group to exhaustion, strictly in submission order.
    async fn run_group(self: Arc<Self>, first: Document) {
        let id = first.id.clone();
        let mut current = first;
        loop {
            self.dispatch(current).await;
            let next = {
                let mut groups = self.groups.lock().unwrap();
                match groups.get_mut(&id).and_then(VecDeque::pop_front) {
                    Some(document) => Some(document),
                    None => {
                        // Retire under the same lock acquisition as the empty
                        // check, so a concurrent enqueue either lands before
                        // it (and is seen here) or recreates the group.
                        groups.remove(&id);
                        None
                    }
                }
            };
            match next {
                Some(document) => current = document,
                None => break,
            }
        }
        self.drained.notify_waiters();
    }

    /// Sends one document and folds its result into the shared state.
    async fn dispatch(&self, document: Document) {
        self.throttler.sent();
        let result = self.feeder.send(document).await;

        self.stats.lock().unwrap().merge(&result.stats);

        if result.status.success() {
            self.throttler.success();
            self.breaker.success();
        } else {
            if result.status == OperationStatus::Throttled {
                self.throttler
                    .throttled(self.inflight.load(Ordering::Relaxed));
            }
            self.breaker.failure();

            #[cfg(feature = "tracing")]
            tracing::debug!(id = %result.id, status = ?result.status, "feed operation failed");
        }

        #[cfg(feature = "metrics")]
        {
            metrics::counter!("docfeed_operations_total", "dispatcher" => self.name.clone())
                .increment(1);
            if !result.status.success() {
                metrics::counter!("docfeed_errors_total", "dispatcher" => self.name.clone())
                    .increment(1);
            }
        }

        self.listeners.emit(&DispatchEvent::OperationCompleted {
            component: self.name.clone(),
            timestamp: Instant::now(),
            id: result.id,
            status: result.status,
        });

        self.release_slot();
    }

    /// Folds a synthetic failure for a document rejected while the breaker
    /// is open.
    fn reject(&self, id: DocId) -> DispatchError {
        {
            let mut stats = self.stats.lock().unwrap();
            stats.operations += 1;
            stats.errors += 1;
        }

        #[cfg(feature = "tracing")]
        tracing::warn!(id = %id, "rejecting document, circuit breaker is open");

        self.listeners.emit(&DispatchEvent::OperationRejected {
            component: self.name.clone(),
            timestamp: Instant::now(),
            id: id.clone(),
        });
        DispatchError::CircuitOpen(id)
    }

    fn is_drained(&self) -> bool {
        self.inflight.load(Ordering::Acquire) == 0 && self.groups.lock().unwrap().is_empty()
    }
}

/// Builder for [`Dispatcher`].
pub struct DispatcherBuilder {
    feeder: Arc<dyn Feeder>,
    throttler: Arc<dyn Throttler>,
    breaker: Arc<CircuitBreaker>,
    name: String,
    listeners: EventListeners<DispatchEvent>,
}

impl DispatcherBuilder {
    /// Names this dispatcher instance in events, logs, and metrics labels.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Registers a callback for every folded result.
    pub fn on_operation_completed<F>(mut self, f: F) -> Self
    where
        F: Fn(&DocId, OperationStatus) + Send + Sync + 'static,
    {
        self.listeners.add(FnListener::new(move |event: &DispatchEvent| {
            if let DispatchEvent::OperationCompleted { id, status, .. } = event {
                f(id, *status);
            }
        }));
        self
    }

    /// Registers a callback for documents rejected while the breaker is open.
    pub fn on_operation_rejected<F>(mut self, f: F) -> Self
    where
        F: Fn(&DocId) + Send + Sync + 'static,
    {
        self.listeners.add(FnListener::new(move |event: &DispatchEvent| {
            if let DispatchEvent::OperationRejected { id, .. } = event {
                f(id);
            }
        }));
        self
    }

    pub fn build(self) -> Dispatcher {
        Dispatcher {
            shared: Arc::new(Shared {
                feeder: self.feeder,
                throttler: self.throttler,
                breaker: self.breaker,
                groups: Mutex::new(HashMap::new()),
                stats: Mutex::new(Stats::default()),
                inflight: AtomicU64::new(0),
                closed: AtomicBool::new(false),
                capacity: Notify::new(),
                drained: Notify::new(),
                listeners: self.listeners,
                name: self.name,
            }),
        }
    }
}
