//! Tracks one upstream's sync status, self-disabling if the node doesn't
//! support the underlying RPC method.
//!
//! Structurally identical to the peer checker (same self-disable rule on
//! "method not supported"), differing only in which RPC it polls and in
//! starting pessimistic: an upstream is `is_syncing = true` until proven
//! otherwise, so it counts as unhealthy before its first successful check.

use crate::chain_client::ChainClient;
use crate::config::UpstreamConfig;
use crate::error::CheckError;
use crate::telemetry::{BoxedSink, CheckDimension, HealthEvent};
use crate::timeout::{self, RPC_REQUEST_TIMEOUT};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

#[derive(Debug)]
pub struct SyncingChecker {
    id: String,
    is_syncing: AtomicBool,
    should_run: AtomicBool,
    last_error: Mutex<Option<CheckError>>,
    sink: BoxedSink,
}

impl SyncingChecker {
    pub async fn new(client: &dyn ChainClient, config: &UpstreamConfig) -> Self {
        Self::with_telemetry(client, config, BoxedSink::default()).await
    }

    pub async fn with_telemetry(client: &dyn ChainClient, config: &UpstreamConfig, sink: BoxedSink) -> Self {
        let checker = Self {
            id: config.id.clone(),
            is_syncing: AtomicBool::new(true),
            should_run: AtomicBool::new(true),
            last_error: Mutex::new(None),
            sink,
        };
        checker.run_check(client).await;
        checker
    }

    pub async fn run_check(&self, client: &dyn ChainClient) {
        if !self.should_run.load(Ordering::Acquire) {
            return;
        }
        match timeout::bounded(RPC_REQUEST_TIMEOUT, client.sync_progress()).await {
            Ok(progress) => {
                self.is_syncing.store(progress.is_some(), Ordering::Release);
                *self.last_error.lock().unwrap() = None;
            }
            Err(err) => {
                if err.is_method_not_supported() {
                    tracing::warn!("syncing checker latching off: method not supported");
                    self.should_run.store(false, Ordering::Release);
                    self.sink
                        .emit(HealthEvent::MethodNotSupportedLatched {
                            upstream: self.id.clone(),
                            dimension: CheckDimension::Syncing,
                        })
                        .await;
                }
                if let CheckError::Timeout { after } = &err {
                    self.sink
                        .emit(HealthEvent::CheckTimeout {
                            upstream: self.id.clone(),
                            dimension: CheckDimension::Syncing,
                            after: *after,
                        })
                        .await;
                }
                *self.last_error.lock().unwrap() = Some(err);
            }
        }
    }

    pub fn is_syncing(&self) -> bool {
        self.is_syncing.load(Ordering::Acquire)
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
        !(has_error || self.is_syncing())
    }
}
