//! Time-bounded numeric aggregator over `Duration` samples.
//!
//! Backed by a ring of coarse time buckets rather than a growing `Vec`, so
//! `add` stays amortized O(1) and eviction never has to scan the full sample
//! history — only whole buckets are dropped once they age past the window.

use crate::clock::{Clock, MonotonicClock};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Number of buckets a window is divided into. Eviction granularity is
/// `window / BUCKET_COUNT`, floored at one second so short windows in tests
/// still get a handful of buckets.
const BUCKET_COUNT: u64 = 60;
const MIN_BUCKET_MILLIS: u64 = 1_000;

#[derive(Debug, Clone, Copy, Default)]
struct Bucket {
    start_millis: u64,
    count: u64,
    sum_millis: u128,
}

/// A container of `(timestamp, value)` samples that only considers samples
/// within the configured window duration when answering queries.
#[derive(Debug)]
pub struct SlidingWindow {
    clock: Arc<dyn Clock>,
    window_millis: u64,
    bucket_millis: u64,
    buckets: Mutex<VecDeque<Bucket>>,
}

impl SlidingWindow {
    pub fn new(window: Duration) -> Self {
        Self::with_clock(window, Arc::new(MonotonicClock::default()))
    }

    pub fn with_clock(window: Duration, clock: Arc<dyn Clock>) -> Self {
        let window_millis = window.as_millis().max(1) as u64;
        let bucket_millis = (window_millis / BUCKET_COUNT).max(MIN_BUCKET_MILLIS);
        Self { clock, window_millis, bucket_millis, buckets: Mutex::new(VecDeque::new()) }
    }

    pub fn add(&self, value: Duration) {
        let now = self.clock.now_millis();
        let bucket_start = now - (now % self.bucket_millis);
        let value_millis = value.as_millis();

        let mut buckets = self.buckets.lock().unwrap();
        Self::evict_locked(&mut buckets, now, self.window_millis);

        match buckets.back_mut() {
            Some(b) if b.start_millis == bucket_start => {
                b.count += 1;
                b.sum_millis += value_millis;
            }
            _ => {
                buckets.push_back(Bucket { start_millis: bucket_start, count: 1, sum_millis: value_millis });
            }
        }
    }

    pub fn count(&self) -> u64 {
        let now = self.clock.now_millis();
        let mut buckets = self.buckets.lock().unwrap();
        Self::evict_locked(&mut buckets, now, self.window_millis);
        buckets.iter().map(|b| b.count).sum()
    }

    pub fn sum(&self) -> Duration {
        let now = self.clock.now_millis();
        let mut buckets = self.buckets.lock().unwrap();
        Self::evict_locked(&mut buckets, now, self.window_millis);
        let total: u128 = buckets.iter().map(|b| b.sum_millis).sum();
        Duration::from_millis(total.min(u128::from(u64::MAX)) as u64)
    }

    pub fn mean(&self) -> Duration {
        let now = self.clock.now_millis();
        let mut buckets = self.buckets.lock().unwrap();
        Self::evict_locked(&mut buckets, now, self.window_millis);
        let count: u64 = buckets.iter().map(|b| b.count).sum();
        if count == 0 {
            return Duration::from_millis(0);
        }
        let total: u128 = buckets.iter().map(|b| b.sum_millis).sum();
        Duration::from_millis((total / u128::from(count)) as u64)
    }

    fn evict_locked(buckets: &mut VecDeque<Bucket>, now: u64, window_millis: u64) {
        while let Some(front) = buckets.front() {
            if now.saturating_sub(front.start_millis) <= window_millis {
                break;
            }
            buckets.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::test_support::ManualClock;

    #[test]
    fn empty_window_reports_zero() {
        let window = SlidingWindow::new(Duration::from_secs(10));
        assert_eq!(window.count(), 0);
        assert_eq!(window.sum(), Duration::from_millis(0));
        assert_eq!(window.mean(), Duration::from_millis(0));
    }

    #[test]
    fn add_is_visible_immediately() {
        let clock = Arc::new(ManualClock::new());
        let window = SlidingWindow::with_clock(Duration::from_secs(10), clock.clone());
        window.add(Duration::from_millis(100));
        assert_eq!(window.count(), 1);
        assert_eq!(window.sum(), Duration::from_millis(100));
        assert_eq!(window.mean(), Duration::from_millis(100));
    }

    #[test]
    fn mean_averages_across_samples() {
        let clock = Arc::new(ManualClock::new());
        let window = SlidingWindow::with_clock(Duration::from_secs(10), clock.clone());
        window.add(Duration::from_millis(100));
        window.add(Duration::from_millis(300));
        assert_eq!(window.count(), 2);
        assert_eq!(window.sum(), Duration::from_millis(400));
        assert_eq!(window.mean(), Duration::from_millis(200));
    }

    #[test]
    fn samples_older_than_window_are_evicted() {
        let clock = Arc::new(ManualClock::new());
        let window = SlidingWindow::with_clock(Duration::from_secs(10), clock.clone());
        window.add(Duration::from_millis(50));
        assert_eq!(window.count(), 1);

        clock.advance(11_000);
        assert_eq!(window.count(), 0);
        assert_eq!(window.sum(), Duration::from_millis(0));
    }

    #[test]
    fn monotonicity_holds_within_the_window() {
        // After add(v) at time t, count() observed at any t' in [t, t+W] is >= 1.
        let clock = Arc::new(ManualClock::new());
        let window = SlidingWindow::with_clock(Duration::from_secs(10), clock.clone());
        window.add(Duration::from_millis(1));
        assert!(window.count() >= 1);
        clock.advance(9_999);
        assert!(window.count() >= 1);
    }

    #[test]
    fn partial_eviction_keeps_recent_buckets() {
        let clock = Arc::new(ManualClock::new());
        let window = SlidingWindow::with_clock(Duration::from_secs(60), clock.clone());
        window.add(Duration::from_millis(10));
        clock.advance(30_000);
        window.add(Duration::from_millis(20));
        clock.advance(35_000);
        // first sample (now 65s old) should be evicted, second (35s old) kept
        assert_eq!(window.count(), 1);
        assert_eq!(window.sum(), Duration::from_millis(20));
    }
}
