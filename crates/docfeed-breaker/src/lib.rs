//! Time-based circuit breaking for the docfeed dispatcher.
//!
//! Instead of counting failures in a sliding window, this breaker watches for
//! a *sustained absence of successes*: a stream of errors is harmless while
//! recent operations still succeed, but a backend that has not produced a
//! single success for longer than the grace period is degraded, and one
//! silent past the doom period is down.
//!
//! ## States
//! - **Closed**: healthy, keep sending
//! - **HalfOpen**: degraded; sending continues so the backend is probed
//! - **Open**: unhealthy; the dispatcher sheds load and fails fast
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use docfeed_breaker::{BreakerState, CircuitBreaker};
//!
//! // Trip to HalfOpen after 10s without a success; never trip to Open.
//! let breaker = CircuitBreaker::new(Duration::from_secs(10), Duration::ZERO);
//! assert_eq!(breaker.state(), BreakerState::Closed);
//!
//! breaker.failure();
//! // Still within the grace period.
//! assert_eq!(breaker.state(), BreakerState::Closed);
//!
//! breaker.success();
//! assert_eq!(breaker.state(), BreakerState::Closed);
//! ```
//!
//! Tests drive the breaker with a manual clock injected through
//! [`CircuitBreaker::builder`].

pub mod breaker;
pub mod config;
pub mod events;

pub use breaker::{BreakerState, CircuitBreaker};
pub use config::CircuitBreakerBuilder;
pub use events::BreakerEvent;
