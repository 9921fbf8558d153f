//! Property tests for `SlidingWindow`'s eviction and aggregation invariants.

use gateway_health::{Clock, SlidingWindow};
use proptest::prelude::*;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Clock driven entirely by the test, mirroring the crate's own internal
/// manual clock but implemented against the public `Clock` trait so it can
/// live outside the crate.
#[derive(Debug, Default)]
struct TestClock {
    now: AtomicU64,
}

impl TestClock {
    fn advance(&self, millis: u64) {
        self.now.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for TestClock {
    fn now_millis(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// A sample added at time `t` is still counted at any `t'` within the
    /// configured window, regardless of how many other samples land first.
    #[test]
    fn add_is_visible_anywhere_within_the_window(
        window_secs in 5u64..=120,
        offset_millis in 0u64..=120_000,
        extra_samples in 0usize..=20,
    ) {
        let window = Duration::from_secs(window_secs);
        let offset = offset_millis.min(window.as_millis() as u64);
        let clock = Arc::new(TestClock::default());
        let sliding = SlidingWindow::with_clock(window, clock.clone());

        sliding.add(Duration::from_millis(1));
        for _ in 0..extra_samples {
            sliding.add(Duration::from_millis(1));
        }
        clock.advance(offset);

        prop_assert!(sliding.count() >= 1);
    }

    /// `mean() * count() <= sum() < mean() * count() + count()` — mean is the
    /// floor of sum/count, so this bound holds for any sequence of samples
    /// observed without any intervening eviction.
    #[test]
    fn mean_is_consistent_with_sum_and_count(
        samples in prop::collection::vec(1u64..=10_000, 1..30),
    ) {
        let clock = Arc::new(TestClock::default());
        let sliding = SlidingWindow::with_clock(Duration::from_secs(3600), clock);

        for s in &samples {
            sliding.add(Duration::from_millis(*s));
        }

        let count = sliding.count();
        let sum = sliding.sum().as_millis() as u64;
        let mean = sliding.mean().as_millis() as u64;

        prop_assert_eq!(count, samples.len() as u64);
        prop_assert_eq!(sum, samples.iter().sum::<u64>());
        prop_assert!(mean * count <= sum);
        prop_assert!(sum < mean * count + count);
    }

    /// Once the clock advances past the window, every prior sample is
    /// evicted and both count and sum return to their empty-window values.
    #[test]
    fn full_eviction_after_window_elapses(
        window_secs in 1u64..=30,
        samples in prop::collection::vec(1u64..=5_000, 1..10),
    ) {
        let window = Duration::from_secs(window_secs);
        let clock = Arc::new(TestClock::default());
        let sliding = SlidingWindow::with_clock(window, clock.clone());

        for s in &samples {
            sliding.add(Duration::from_millis(*s));
        }
        prop_assert!(sliding.count() >= 1);

        clock.advance(window.as_millis() as u64 + 2_000);
        prop_assert_eq!(sliding.count(), 0);
        prop_assert_eq!(sliding.sum(), Duration::from_millis(0));
        prop_assert_eq!(sliding.mean(), Duration::from_millis(0));
    }
}
