//! Core infrastructure shared by the docfeed crates.
//!
//! This crate provides the cross-cutting pieces the component crates build on:
//! - [`clock`]: time as an injected capability, so the throttler and the
//!   circuit breaker can be driven by a deterministic clock in tests
//! - [`events`]: the event-listener system components use for observability
//!   hooks

pub mod clock;
pub mod events;

pub use clock::{system_clock, Clock, ManualClock};
pub use events::{EventListener, EventListeners, FeedEvent, FnListener};
