//! Tracks one upstream's peer count, self-disabling if the node doesn't
//! support the underlying RPC method.

use crate::chain_client::ChainClient;
use crate::config::UpstreamConfig;
use crate::error::CheckError;
use crate::telemetry::{BoxedSink, CheckDimension, HealthEvent};
use crate::timeout::{self, RPC_REQUEST_TIMEOUT};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

/// Minimum peer count an upstream must report to pass this dimension.
pub const MIN_PEERS: u64 = 5;

#[derive(Debug)]
pub struct PeerChecker {
    id: String,
    peer_count: AtomicU64,
    should_run: AtomicBool,
    last_error: Mutex<Option<CheckError>>,
    sink: BoxedSink,
}

impl PeerChecker {
    /// Builds the checker and runs one initial check synchronously, per
    /// the construction contract (the first observation determines whether
    /// peer counting is supported at all).
    pub async fn new(client: &dyn ChainClient, config: &UpstreamConfig) -> Self {
        Self::with_telemetry(client, config, BoxedSink::default()).await
    }

    pub async fn with_telemetry(client: &dyn ChainClient, config: &UpstreamConfig, sink: BoxedSink) -> Self {
        let checker = Self {
            id: config.id.clone(),
            peer_count: AtomicU64::new(0),
            should_run: AtomicBool::new(!config.health_check_config.skip_peer_count_check),
            last_error: Mutex::new(None),
            sink,
        };
        if checker.should_run.load(Ordering::Acquire) {
            checker.run_check(client).await;
        }
        checker
    }

    pub async fn run_check(&self, client: &dyn ChainClient) {
        if !self.should_run.load(Ordering::Acquire) {
            return;
        }
        match timeout::bounded(RPC_REQUEST_TIMEOUT, client.peer_count()).await {
            Ok(count) => {
                self.peer_count.store(count, Ordering::Release);
                *self.last_error.lock().unwrap() = None;
            }
            Err(err) => {
                if err.is_method_not_supported() {
                    tracing::warn!("peer checker latching off: method not supported");
                    self.should_run.store(false, Ordering::Release);
                    self.sink
                        .emit(HealthEvent::MethodNotSupportedLatched {
                            upstream: self.id.clone(),
                            dimension: CheckDimension::Peer,
                        })
                        .await;
                }
                if let CheckError::Timeout { after } = &err {
                    self.sink
                        .emit(HealthEvent::CheckTimeout {
                            upstream: self.id.clone(),
                            dimension: CheckDimension::Peer,
                            after: *after,
                        })
                        .await;
                }
                *self.last_error.lock().unwrap() = Some(err);
            }
        }
    }

    pub fn peer_count(&self) -> u64 {
        self.peer_count.load(Ordering::Acquire)
    }

    pub fn error(&self) -> Option<CheckError> {
        self.last_error.lock().unwrap().clone()
    }

    pub fn should_run(&self) -> bool {
        self.should_run.load(Ordering::Acquire)
    }

    pub fn is_passing(&self) -> bool {
        if !self.should_run.load(Ordering::Acquire) {
            return true;
        }
        let has_error = self.last_error.lock().unwrap().is_some();
        !(has_error || self.peer_count() < MIN_PEERS)
    }
}
