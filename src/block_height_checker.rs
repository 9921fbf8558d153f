//! Maintains one upstream's latest observed block number, either via a
//! push subscription or HTTP polling.

use crate::chain_client::ChainClient;
use crate::chain_metadata_store::ChainMetadataStore;
use crate::config::UpstreamConfig;
use crate::error::CheckError;
use crate::telemetry::{BoxedSink, CheckDimension, HealthEvent};
use crate::timeout::{self, RPC_REQUEST_TIMEOUT};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug)]
pub struct BlockHeightChecker {
    id: String,
    block_height: AtomicU64,
    last_error: Mutex<Option<CheckError>>,
    using_ws: AtomicBool,
    ws_errored: AtomicBool,
    sink: BoxedSink,
}

impl BlockHeightChecker {
    /// Constructs the checker and, if a WS path is available, spawns the
    /// long-running subscription task that feeds `block_height` forward.
    /// Falls back to the HTTP path immediately if subscription setup
    /// itself fails.
    pub async fn spawn(
        id: String,
        client: Arc<dyn ChainClient>,
        config: &UpstreamConfig,
        store: Arc<ChainMetadataStore>,
    ) -> Arc<Self> {
        Self::spawn_with_telemetry(id, client, config, store, BoxedSink::default()).await
    }

    pub async fn spawn_with_telemetry(
        id: String,
        client: Arc<dyn ChainClient>,
        config: &UpstreamConfig,
        store: Arc<ChainMetadataStore>,
        sink: BoxedSink,
    ) -> Arc<Self> {
        let checker = Arc::new(Self {
            id: id.clone(),
            block_height: AtomicU64::new(0),
            last_error: Mutex::new(None),
            using_ws: AtomicBool::new(false),
            ws_errored: AtomicBool::new(false),
            sink,
        });

        if config.use_ws_for_block_height() {
            match client.subscribe_new_heads().await {
                Ok(subscription) => {
                    checker.using_ws.store(true, Ordering::Release);
                    tokio::spawn(Self::drive_subscription(checker.clone(), id, subscription, store));
                }
                Err(err) => {
                    tracing::warn!(error = %err, "ws subscription setup failed, falling back to http");
                    checker.sink.emit_spawned(HealthEvent::WsFallback { upstream: id.clone() });
                    *checker.last_error.lock().unwrap() = Some(err);
                }
            }
        }

        checker
    }

    async fn drive_subscription(
        self: Arc<Self>,
        id: String,
        mut subscription: crate::chain_client::Subscription,
        store: Arc<ChainMetadataStore>,
    ) {
        loop {
            tokio::select! {
                header = subscription.events.recv() => {
                    match header {
                        Some(header) => {
                            self.block_height.store(header.number, Ordering::Release);
                            store.record_block_height(&id, header.number);
                            *self.last_error.lock().unwrap() = None;
                            self.ws_errored.store(false, Ordering::Release);
                        }
                        None => break,
                    }
                }
                err = subscription.errors.recv() => {
                    match err {
                        Some(err) => {
                            tracing::warn!(upstream = %id, error = %err, "ws subscription error, falling back to http");
                            if !self.ws_errored.swap(true, Ordering::AcqRel) {
                                self.sink.emit(HealthEvent::WsFallback { upstream: id.clone() }).await;
                            }
                            *self.last_error.lock().unwrap() = Some(err);
                        }
                        None => break,
                    }
                }
            }
        }
    }

    /// `None` means "use WS", issuing no HTTP call. Otherwise polls over
    /// HTTP, updating `block_height`/`last_error` and the shared metadata
    /// store.
    pub async fn run_check(&self, id: &str, client: &dyn ChainClient, store: &ChainMetadataStore) {
        if self.using_ws.load(Ordering::Acquire) && !self.ws_errored.load(Ordering::Acquire) {
            return;
        }
        match timeout::bounded(RPC_REQUEST_TIMEOUT, client.header_by_number(None)).await {
            Ok(header) => {
                self.block_height.store(header.number, Ordering::Release);
                store.record_block_height(id, header.number);
                *self.last_error.lock().unwrap() = None;
            }
            Err(err) => {
                if let CheckError::Timeout { after } = &err {
                    self.sink
                        .emit(HealthEvent::CheckTimeout {
                            upstream: id.to_string(),
                            dimension: CheckDimension::BlockHeight,
                            after: *after,
                        })
                        .await;
                }
                *self.last_error.lock().unwrap() = Some(err);
            }
        }
    }

    pub fn block_height(&self) -> u64 {
        self.block_height.load(Ordering::Acquire)
    }

    pub fn error(&self) -> Option<CheckError> {
        self.last_error.lock().unwrap().clone()
    }

    pub fn is_using_ws(&self) -> bool {
        self.using_ws.load(Ordering::Acquire) && !self.ws_errored.load(Ordering::Acquire)
    }

    /// Passes unless there is a recorded error and this upstream's known
    /// height trails the fleet maximum by more than the configured drift.
    pub fn is_passing(&self, max_block_height: u64, max_block_height_drift: u64) -> bool {
        let has_error = self.last_error.lock().unwrap().is_some();
        if !has_error {
            return true;
        }
        let height = self.block_height();
        let within_drift = height + max_block_height_drift >= max_block_height;
        if within_drift {
            self.sink.emit_spawned(HealthEvent::BlockHeightErrorMasked {
                upstream: self.id.clone(),
                block_height: height,
                max_block_height,
            });
        }
        within_drift
    }

    #[cfg(test)]
    pub(crate) fn for_test(height: u64, error: Option<CheckError>) -> Self {
        Self {
            id: "test".into(),
            block_height: AtomicU64::new(height),
            last_error: Mutex::new(error),
            using_ws: AtomicBool::new(false),
            ws_errored: AtomicBool::new(false),
            sink: BoxedSink::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain_client::test_support::FakeChainClient;

    fn http_only_config() -> UpstreamConfig {
        UpstreamConfig {
            id: "a".into(),
            group_id: None,
            http_url: "http://a".into(),
            ws_url: None,
            basic_auth: None,
            request_headers: Default::default(),
            health_check_config: Default::default(),
        }
    }

    #[tokio::test]
    async fn http_path_polls_on_every_run_check() {
        let fake = Arc::new(FakeChainClient::new());
        fake.headers.lock().unwrap().push(Ok(crate::chain_client::Header { number: 42 }));
        let client: Arc<dyn ChainClient> = fake.clone();
        let store = Arc::new(ChainMetadataStore::new());
        let config = http_only_config();
        let checker = BlockHeightChecker::spawn("a".into(), client.clone(), &config, store.clone()).await;
        assert!(!checker.is_using_ws());

        checker.run_check("a", client.as_ref(), &store).await;
        assert_eq!(checker.block_height(), 42);
        assert_eq!(store.max_block_height(), 42);
        assert_eq!(fake.header_call_count(), 1);
    }

    #[tokio::test]
    async fn is_passing_suppresses_transient_error_when_at_fleet_max() {
        let checker = BlockHeightChecker::for_test(100, Some(CheckError::Rpc { message: "timeout".into() }));
        assert!(checker.is_passing(100, 0));
        assert!(!checker.is_passing(150, 0));
        assert!(checker.is_passing(105, 10));
    }

    #[tokio::test]
    async fn is_passing_true_with_no_error_regardless_of_height() {
        let checker = BlockHeightChecker::for_test(0, None);
        assert!(checker.is_passing(1_000_000, 0));
    }

    #[tokio::test]
    async fn ws_setup_failure_emits_fallback_event() {
        use crate::telemetry::{BoxedSink, HealthEvent, MemorySink};

        let fake = Arc::new(FakeChainClient::new());
        fake.headers.lock().unwrap().push(Ok(crate::chain_client::Header { number: 1 }));
        let client: Arc<dyn ChainClient> = fake;
        let store = Arc::new(ChainMetadataStore::new());
        let memory = MemorySink::new();
        let config = UpstreamConfig {
            id: "a".into(),
            group_id: None,
            http_url: "http://a".into(),
            ws_url: Some("ws://a".into()),
            basic_auth: None,
            request_headers: Default::default(),
            health_check_config: Default::default(),
        };

        let checker = BlockHeightChecker::spawn_with_telemetry(
            "a".into(),
            client,
            &config,
            store,
            BoxedSink::new(memory.clone()),
        )
        .await;
        assert!(!checker.is_using_ws());
        assert!(memory.events().iter().any(|e| matches!(e, HealthEvent::WsFallback { .. })));
    }

    #[tokio::test]
    async fn is_passing_emits_masked_event_when_suppressing_a_transient_error() {
        use crate::telemetry::{BoxedSink, HealthEvent, MemorySink};

        let memory = MemorySink::new();
        let checker = BlockHeightChecker {
            id: "a".into(),
            block_height: AtomicU64::new(100),
            last_error: Mutex::new(Some(CheckError::Rpc { message: "timeout".into() })),
            using_ws: AtomicBool::new(false),
            ws_errored: AtomicBool::new(false),
            sink: BoxedSink::new(memory.clone()),
        };

        assert!(checker.is_passing(100, 0));
        tokio::task::yield_now().await;
        assert!(memory.events().iter().any(|e| matches!(e, HealthEvent::BlockHeightErrorMasked { .. })));
    }
}
