//! Breaker properties.
//!
//! Invariant tested: under a pure failure stream the observed state walks
//! monotonically through Closed, HalfOpen, Open and never regresses.

use std::time::Duration;

use docfeed_breaker::{BreakerState, CircuitBreaker};
use docfeed_core::clock::ManualClock;
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn failure_streams_never_regress_the_state(
        steps in proptest::collection::vec(0u64..2_000, 1..100),
    ) {
        let clock = ManualClock::new(Duration::ZERO);
        let breaker = CircuitBreaker::builder()
            .grace_period(Duration::from_secs(1))
            .doom_period(Duration::from_secs(5))
            .clock(clock.clock())
            .build();

        let mut previous = BreakerState::Closed;
        for millis in steps {
            breaker.failure();
            clock.advance(Duration::from_millis(millis));
            let state = breaker.state();
            prop_assert!(
                state >= previous,
                "state {:?} regressed from {:?}",
                state,
                previous
            );
            previous = state;
        }
    }

    #[test]
    fn a_single_success_always_closes(
        advance_secs in 0u64..100,
    ) {
        let clock = ManualClock::new(Duration::ZERO);
        let breaker = CircuitBreaker::builder()
            .grace_period(Duration::from_secs(1))
            .doom_period(Duration::from_secs(5))
            .clock(clock.clock())
            .build();

        breaker.failure();
        clock.advance(Duration::from_secs(advance_secs));
        let _ = breaker.state();
        breaker.success();
        prop_assert_eq!(breaker.state(), BreakerState::Closed);
    }
}
