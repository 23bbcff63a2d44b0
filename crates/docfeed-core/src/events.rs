//! Event-listener infrastructure for observability hooks.
//!
//! Components emit typed events (target revisions, breaker transitions,
//! completed operations) through an [`EventListeners`] collection. Listeners
//! are registered through the component builders' `on_*` hooks or directly
//! with [`EventListeners::add`].

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// An event emitted by a docfeed component.
pub trait FeedEvent: Send + Sync + fmt::Debug {
    /// Machine-readable event kind, e.g. `"target_updated"`.
    fn event_type(&self) -> &'static str;

    /// When the event occurred.
    fn timestamp(&self) -> Instant;

    /// Name of the component instance that emitted the event.
    fn component(&self) -> &str;
}

/// Observes events of type `E`.
pub trait EventListener<E: FeedEvent>: Send + Sync {
    fn on_event(&self, event: &E);
}

/// A set of listeners sharing one event stream.
#[derive(Clone)]
pub struct EventListeners<E: FeedEvent> {
    listeners: Vec<Arc<dyn EventListener<E>>>,
}

impl<E: FeedEvent> EventListeners<E> {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    /// Adds a listener to the collection.
    pub fn add<L>(&mut self, listener: L)
    where
        L: EventListener<E> + 'static,
    {
        self.listeners.push(Arc::new(listener));
    }

    /// Emits `event` to every listener.
    ///
    /// A panicking listener is caught and skipped so the remaining listeners
    /// still observe the event.
    pub fn emit(&self, event: &E) {
        for listener in &self.listeners {
            let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                listener.on_event(event);
            }));
            if outcome.is_err() {
                #[cfg(feature = "tracing")]
                tracing::warn!(
                    event_type = event.event_type(),
                    component = event.component(),
                    "event listener panicked"
                );
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }
}

impl<E: FeedEvent> Default for EventListeners<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Wraps a closure as an [`EventListener`].
pub struct FnListener<E, F>
where
    F: Fn(&E) + Send + Sync,
{
    f: F,
    _marker: std::marker::PhantomData<fn(&E)>,
}

impl<E, F> FnListener<E, F>
where
    F: Fn(&E) + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self {
            f,
            _marker: std::marker::PhantomData,
        }
    }
}

impl<E, F> EventListener<E> for FnListener<E, F>
where
    E: FeedEvent,
    F: Fn(&E) + Send + Sync,
{
    fn on_event(&self, event: &E) {
        (self.f)(event);
    }
}
