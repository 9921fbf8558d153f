//! Shared `ChainClient` test double for black-box tests, built only against
//! the public API — the crate's own internal fake stays `#[cfg(test)]`-only
//! and is never reused outside its unit tests.

#![allow(dead_code)]

use async_trait::async_trait;
use gateway_health::chain_client::{ChainClient, Header, Subscription, SyncProgress};
use gateway_health::CheckError;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc;

/// Scriptable `ChainClient`: every method pops its next queued result, an
/// empty queue yields a generic RPC error. WS support is opt-in via
/// `with_ws`, which hands the caller the sender half of both the header and
/// error channels.
#[derive(Default)]
pub struct ScriptedClient {
    pub headers: Mutex<Vec<Result<Header, CheckError>>>,
    pub peer_counts: Mutex<Vec<Result<u64, CheckError>>>,
    pub sync_progresses: Mutex<Vec<Result<Option<SyncProgress>, CheckError>>>,
    header_calls: AtomicU64,
    ws_channels: Mutex<Option<(mpsc::Receiver<Header>, mpsc::Receiver<CheckError>)>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ws(self) -> (Self, mpsc::Sender<Header>, mpsc::Sender<CheckError>) {
        let (header_tx, header_rx) = mpsc::channel(8);
        let (error_tx, error_rx) = mpsc::channel(8);
        *self.ws_channels.lock().unwrap() = Some((header_rx, error_rx));
        (self, header_tx, error_tx)
    }

    pub fn header_call_count(&self) -> u64 {
        self.header_calls.load(Ordering::SeqCst)
    }

    pub fn push_header(&self, number: u64) {
        self.headers.lock().unwrap().push(Ok(Header { number }));
    }
}

#[async_trait]
impl ChainClient for ScriptedClient {
    async fn header_by_number(&self, _number: Option<u64>) -> Result<Header, CheckError> {
        self.header_calls.fetch_add(1, Ordering::SeqCst);
        self.headers
            .lock()
            .unwrap()
            .pop()
            .unwrap_or(Err(CheckError::Rpc { message: "exhausted".into() }))
    }

    async fn subscribe_new_heads(&self) -> Result<Subscription, CheckError> {
        match self.ws_channels.lock().unwrap().take() {
            Some((events, errors)) => Ok(Subscription::new(events, errors, || {})),
            None => Err(CheckError::Subscription { message: "no ws configured".into() }),
        }
    }

    async fn peer_count(&self) -> Result<u64, CheckError> {
        self.peer_counts
            .lock()
            .unwrap()
            .pop()
            .unwrap_or(Err(CheckError::Rpc { message: "exhausted".into() }))
    }

    async fn sync_progress(&self) -> Result<Option<SyncProgress>, CheckError> {
        self.sync_progresses
            .lock()
            .unwrap()
            .pop()
            .unwrap_or(Err(CheckError::Rpc { message: "exhausted".into() }))
    }

    async fn record_latency(&self, _method: &str) -> Result<Duration, CheckError> {
        Ok(Duration::from_millis(0))
    }
}
