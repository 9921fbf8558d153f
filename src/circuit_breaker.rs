//! Passive circuit breakers used by the error/latency checker.
//!
//! Unlike a request-admission breaker (open → half-open probe → closed), a
//! health breaker here gates a read-only predicate: it has exactly two
//! states, closed and open, and recovers purely on elapsed time (the ban
//! window), with no probe call of its own. See the design notes for why the
//! half-open/probe shape used elsewhere in this family of crates doesn't fit
//! this use case.

use crate::clock::{Clock, MonotonicClock};
use crate::telemetry::{BoxedSink, BreakerKind, HealthEvent};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const BUCKET_COUNT: u64 = 60;
const MIN_BUCKET_MILLIS: u64 = 1_000;

#[derive(Debug, Clone, Copy, Default)]
struct RateBucket {
    start_millis: u64,
    total: u64,
    failures: u64,
}

/// Bucketed `(timestamp, success|failure)` sample window, shared by the
/// error breaker and every per-method latency breaker.
#[derive(Debug)]
struct RateWindow {
    clock: Arc<dyn Clock>,
    window_millis: u64,
    bucket_millis: u64,
    buckets: Mutex<VecDeque<RateBucket>>,
}

impl RateWindow {
    fn new(window: Duration, clock: Arc<dyn Clock>) -> Self {
        let window_millis = window.as_millis().max(1) as u64;
        let bucket_millis = (window_millis / BUCKET_COUNT).max(MIN_BUCKET_MILLIS);
        Self { clock, window_millis, bucket_millis, buckets: Mutex::new(VecDeque::new()) }
    }

    fn record(&self, is_failure: bool) {
        let now = self.clock.now_millis();
        let bucket_start = now - (now % self.bucket_millis);

        let mut buckets = self.buckets.lock().unwrap();
        self.evict_locked(&mut buckets, now);

        match buckets.back_mut() {
            Some(b) if b.start_millis == bucket_start => {
                b.total += 1;
                if is_failure {
                    b.failures += 1;
                }
            }
            _ => {
                buckets.push_back(RateBucket {
                    start_millis: bucket_start,
                    total: 1,
                    failures: u64::from(is_failure),
                });
            }
        }
    }

    /// Returns `(failures, total)` observed within the window.
    fn tally(&self) -> (u64, u64) {
        let now = self.clock.now_millis();
        let mut buckets = self.buckets.lock().unwrap();
        self.evict_locked(&mut buckets, now);
        buckets.iter().fold((0, 0), |(f, t), b| (f + b.failures, t + b.total))
    }

    fn evict_locked(&self, buckets: &mut VecDeque<RateBucket>, now: u64) {
        while let Some(front) = buckets.front() {
            if now.saturating_sub(front.start_millis) <= self.window_millis {
                break;
            }
            buckets.pop_front();
        }
    }
}

/// Error-rate breaker: opens when the failure rate over the detection
/// window reaches `error_rate`, with at least one observed sample; stays
/// open for `ban_window`, then closes automatically.
#[derive(Debug)]
pub struct ErrorBreaker {
    window: RateWindow,
    clock: Arc<dyn Clock>,
    error_rate: f64,
    ban_window_millis: u64,
    open: AtomicBool,
    opened_at_millis: AtomicU64,
    telemetry: Option<(String, BreakerKind)>,
    sink: BoxedSink,
}

impl ErrorBreaker {
    pub fn new(error_rate: f64, detection_window: Duration, ban_window: Duration) -> Self {
        Self::with_clock(error_rate, detection_window, ban_window, Arc::new(MonotonicClock::default()))
    }

    pub fn with_clock(
        error_rate: f64,
        detection_window: Duration,
        ban_window: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            window: RateWindow::new(detection_window, clock.clone()),
            clock,
            error_rate,
            ban_window_millis: ban_window.as_millis().max(1) as u64,
            open: AtomicBool::new(false),
            opened_at_millis: AtomicU64::new(0),
            telemetry: None,
            sink: BoxedSink::default(),
        }
    }

    /// Attaches the upstream id and breaker label used to label
    /// `HealthEvent::BreakerOpened`/`BreakerClosed` emissions, and the sink
    /// they're delivered to. A breaker with no telemetry attached stays
    /// silent (matches pre-existing construction sites and plain unit tests).
    pub fn with_telemetry(mut self, upstream: impl Into<String>, kind: BreakerKind, sink: BoxedSink) -> Self {
        self.telemetry = Some((upstream.into(), kind));
        self.sink = sink;
        self
    }

    /// Record the outcome of one observation.
    pub fn record(&self, is_error: bool) {
        self.window.record(is_error);
        if !self.open.load(Ordering::Acquire) {
            let (failures, total) = self.window.tally();
            if total > 0 && (failures as f64 / total as f64) >= self.error_rate {
                self.opened_at_millis.store(self.clock.now_millis(), Ordering::Release);
                if !self.open.swap(true, Ordering::AcqRel) {
                    tracing::warn!(failures, total, rate = self.error_rate, "circuit breaker → open");
                    if let Some((upstream, kind)) = &self.telemetry {
                        self.sink.emit_spawned(HealthEvent::BreakerOpened {
                            upstream: upstream.clone(),
                            breaker: kind.clone(),
                            failures,
                            total,
                        });
                    }
                }
            }
        }
    }

    pub fn is_open(&self) -> bool {
        if !self.open.load(Ordering::Acquire) {
            return false;
        }
        let opened_at = self.opened_at_millis.load(Ordering::Acquire);
        let elapsed = self.clock.now_millis().saturating_sub(opened_at);
        if elapsed >= self.ban_window_millis {
            if self.open.swap(false, Ordering::AcqRel) {
                tracing::info!("circuit breaker → closed (ban window elapsed)");
                if let Some((upstream, kind)) = &self.telemetry {
                    self.sink.emit_spawned(HealthEvent::BreakerClosed {
                        upstream: upstream.clone(),
                        breaker: kind.clone(),
                    });
                }
            }
            false
        } else {
            true
        }
    }
}

/// Per-method latency breaker: identical transition rules to `ErrorBreaker`,
/// but a sample is a failure when `latency >= threshold`.
#[derive(Debug)]
pub struct LatencyBreaker {
    inner: ErrorBreaker,
    threshold: Duration,
}

impl LatencyBreaker {
    pub fn new(threshold: Duration, failure_rate: f64, detection_window: Duration, ban_window: Duration) -> Self {
        Self { inner: ErrorBreaker::new(failure_rate, detection_window, ban_window), threshold }
    }

    pub fn with_clock(
        threshold: Duration,
        failure_rate: f64,
        detection_window: Duration,
        ban_window: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            inner: ErrorBreaker::with_clock(failure_rate, detection_window, ban_window, clock),
            threshold,
        }
    }

    pub fn with_telemetry(mut self, upstream: impl Into<String>, method: impl Into<String>, sink: BoxedSink) -> Self {
        self.inner = self.inner.with_telemetry(upstream, BreakerKind::Latency { method: method.into() }, sink);
        self
    }

    pub fn record(&self, latency: Duration) {
        self.inner.record(latency >= self.threshold);
    }

    pub fn is_open(&self) -> bool {
        self.inner.is_open()
    }

    pub fn threshold(&self) -> Duration {
        self.threshold
    }
}
