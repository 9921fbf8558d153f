//! Abstraction for the health check manager's periodic driver.
//!
//! The manager must not gate its next tick on a naive `sleep` — the spec
//! calls for a ticker that tests can drive directly, so a tick boundary can
//! be asserted without waiting on wall-clock time. `TokioTicker` is the
//! production implementation; `ManualTicker` is driven entirely by test
//! code.

use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Interval, MissedTickBehavior};

/// Default interval between manager ticks (§2, `T_tick`).
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(5);

#[async_trait]
pub trait Ticker: Send {
    /// Waits for the next tick boundary.
    async fn tick(&mut self);
}

/// Production ticker backed by `tokio::time::interval`.
pub struct TokioTicker {
    interval: Interval,
}

impl TokioTicker {
    pub fn new(period: Duration) -> Self {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval }
    }
}

#[async_trait]
impl Ticker for TokioTicker {
    async fn tick(&mut self) {
        self.interval.tick().await;
    }
}

/// Test ticker: advances only when the test sends on the paired handle.
pub struct ManualTicker {
    rx: mpsc::Receiver<()>,
}

#[derive(Clone)]
pub struct ManualTickHandle {
    tx: mpsc::Sender<()>,
}

impl ManualTickHandle {
    /// Triggers the next tick. Returns `false` if the ticker was dropped.
    pub async fn fire(&self) -> bool {
        self.tx.send(()).await.is_ok()
    }
}

impl ManualTicker {
    pub fn new() -> (Self, ManualTickHandle) {
        let (tx, rx) = mpsc::channel(1);
        (Self { rx }, ManualTickHandle { tx })
    }
}

#[async_trait]
impl Ticker for ManualTicker {
    async fn tick(&mut self) {
        let _ = self.rx.recv().await;
    }
}
