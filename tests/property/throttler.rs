//! Throttler properties.
//!
//! Invariant tested: whatever the event mix, `target_inflight` never leaves
//! `[MIN_INFLIGHT, MAX_INFLIGHT]`.

use std::time::Duration;

use docfeed_core::clock::ManualClock;
use docfeed_throttler::{DynamicThrottler, Throttler, MAX_INFLIGHT, MIN_INFLIGHT};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn target_never_escapes_the_clamp(
        events in proptest::collection::vec((0u8..3, 0u64..100_000), 1..1500),
        seed in any::<u64>(),
    ) {
        let clock = ManualClock::new(Duration::from_millis(250));
        let throttler = DynamicThrottler::builder()
            .clock(clock.clock())
            .seed(seed)
            .build();

        for (kind, value) in events {
            match kind {
                0 => throttler.sent(),
                1 => throttler.success(),
                _ => throttler.throttled(value),
            }
            let target = throttler.target_inflight();
            prop_assert!(
                (MIN_INFLIGHT..=MAX_INFLIGHT).contains(&target),
                "target {} escaped the clamp",
                target
            );
        }
    }

    #[test]
    fn throttle_signal_caps_the_target_at_half_the_load(
        inflight in 0u64..1_000_000,
    ) {
        let throttler = DynamicThrottler::builder().seed(3).build();
        throttler.throttled(inflight);
        let target = throttler.target_inflight();
        prop_assert!(target <= (inflight / 2).max(MIN_INFLIGHT));
    }
}
