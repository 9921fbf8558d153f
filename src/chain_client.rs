//! The capability set the health-check core consumes from the outside
//! world. Request decoding, transport, and RPC framing all live outside
//! this crate; checkers only ever see this trait.

use crate::error::CheckError;
use async_trait::async_trait;
use std::fmt;
use std::time::Duration;
use tokio::sync::mpsc;

/// A block header as returned by `header_by_number`. Only the fields the
/// checkers need are modeled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub number: u64,
}

/// Non-nil iff the node reports itself as still catching up to the chain
/// tip; the specific progress fields are opaque to this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncProgress {
    pub highest_block: u64,
    pub current_block: u64,
}

/// A live `newHeads` subscription. Headers arrive on `events`; a
/// subscription failure (transport drop, server-side error) arrives on
/// `errors` exactly once before the subscription is considered dead.
pub struct Subscription {
    pub events: mpsc::Receiver<Header>,
    pub errors: mpsc::Receiver<CheckError>,
    unsubscribe: Box<dyn FnOnce() + Send>,
}

impl Subscription {
    pub fn new(
        events: mpsc::Receiver<Header>,
        errors: mpsc::Receiver<CheckError>,
        unsubscribe: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self { events, errors, unsubscribe: Box::new(unsubscribe) }
    }

    pub fn unsubscribe(self) {
        (self.unsubscribe)();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

/// The outbound interface one upstream's checkers call through. A single
/// implementation talks HTTP and WS to one configured upstream; the core
/// never constructs or owns the transport itself.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Fetches a header by number, or the chain tip when `number` is `None`.
    async fn header_by_number(&self, number: Option<u64>) -> Result<Header, CheckError>;

    /// Opens a `newHeads` push subscription. Returns `Err` immediately if
    /// subscription setup itself fails (no WS endpoint, handshake failure).
    async fn subscribe_new_heads(&self) -> Result<Subscription, CheckError>;

    /// Current peer count, or `MethodNotSupported` if the node doesn't
    /// expose one.
    async fn peer_count(&self) -> Result<u64, CheckError>;

    /// `None` when the node reports it is not syncing.
    async fn sync_progress(&self) -> Result<Option<SyncProgress>, CheckError>;

    /// Issues an active latency probe for `method`, returning the observed
    /// round-trip time. Used only where active latency probing (as opposed
    /// to passive observation via `record_request`) is configured.
    async fn record_latency(&self, method: &str) -> Result<Duration, CheckError>;
}
