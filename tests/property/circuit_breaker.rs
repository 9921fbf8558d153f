//! Property tests for `ErrorBreaker`'s open/close state machine.

use gateway_health::{Clock, ErrorBreaker};
use proptest::prelude::*;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

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

    /// For any breaker opened at `t0`, `is_open()` returns `false` once the
    /// clock has advanced at least `ban_window` past `t0`, with no external
    /// intervention beyond the passage of time.
    #[test]
    fn self_heals_once_ban_window_elapses(
        ban_window_secs in 1u64..=120,
        extra_millis in 0u64..=5_000,
    ) {
        let clock = Arc::new(TestClock::default());
        let breaker = ErrorBreaker::with_clock(
            1.0,
            Duration::from_secs(10),
            Duration::from_secs(ban_window_secs),
            clock.clone(),
        );

        breaker.record(true);
        prop_assert!(breaker.is_open());

        clock.advance(ban_window_secs * 1_000 + extra_millis);
        prop_assert!(!breaker.is_open());
    }

    /// A breaker fed a failure rate strictly below its threshold never
    /// opens, no matter how many samples it observes.
    #[test]
    fn stays_closed_below_threshold(
        rate in 0.1f64..=0.9,
        total in 10u64..=200,
    ) {
        let failures = ((total as f64) * (rate - 0.05)).floor() as u64;
        let clock = Arc::new(TestClock::default());
        let breaker = ErrorBreaker::with_clock(
            rate,
            Duration::from_secs(3600),
            Duration::from_secs(30),
            clock,
        );

        for i in 0..total {
            breaker.record(i < failures);
        }

        prop_assert!(!breaker.is_open());
    }

    /// A breaker fed a failure rate at or above its threshold opens, and
    /// stays open until the ban window elapses.
    #[test]
    fn opens_at_or_above_threshold_and_stays_open_before_ban_window(
        rate in 0.1f64..=1.0,
        total in 2u64..=50,
    ) {
        let clock = Arc::new(TestClock::default());
        let breaker = ErrorBreaker::with_clock(
            rate,
            Duration::from_secs(3600),
            Duration::from_secs(30),
            clock.clone(),
        );

        for _ in 0..total {
            breaker.record(true);
        }

        prop_assert!(breaker.is_open());
        clock.advance(29_000);
        prop_assert!(breaker.is_open());
    }
}
