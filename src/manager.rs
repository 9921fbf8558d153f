//! Owns the set of upstream statuses, spawns checkers, runs the periodic
//! tick, and answers "healthy among these" for the router.

use crate::block_height_checker::BlockHeightChecker;
use crate::chain_client::ChainClient;
use crate::chain_metadata_store::ChainMetadataStore;
use crate::config::{RoutingConfig, UpstreamConfig};
use crate::error::ConfigError;
use crate::error_latency_checker::ErrorLatencyChecker;
use crate::peer_checker::PeerChecker;
use crate::status::UpstreamStatus;
use crate::syncing_checker::SyncingChecker;
use crate::telemetry::BoxedSink;
use crate::ticker::{Ticker, TokioTicker, DEFAULT_TICK_INTERVAL};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::Notify;
use tokio::task::JoinHandle;

/// Per-upstream collaborators the manager needs but does not itself
/// construct: a chain client and the configuration driving its checkers.
pub struct UpstreamEntry {
    pub config: UpstreamConfig,
    pub client: Arc<dyn ChainClient>,
}

pub struct HealthCheckManager {
    store: Arc<ChainMetadataStore>,
    routing_config: Arc<RoutingConfig>,
    statuses: Arc<RwLock<HashMap<String, Arc<UpstreamStatus>>>>,
    entries: Arc<HashMap<String, UpstreamEntry>>,
    running: Arc<AtomicBool>,
    shutdown: Arc<Notify>,
    driver: RwLock<Option<JoinHandle<()>>>,
}

impl HealthCheckManager {
    /// Constructs every upstream's status bundle in parallel. Each bundle
    /// is only inserted once all four of its checkers have finished
    /// constructing, so no partial bundle is ever observable through
    /// `statuses`.
    pub async fn new(
        entries: Vec<UpstreamEntry>,
        routing_config: RoutingConfig,
    ) -> Result<Self, ConfigError> {
        Self::new_with_telemetry(entries, routing_config, BoxedSink::default()).await
    }

    /// Same as [`Self::new`], but every checker and breaker reports its
    /// state transitions to `sink` (§9: telemetry is an injected
    /// collaborator, never a process-wide singleton).
    pub async fn new_with_telemetry(
        entries: Vec<UpstreamEntry>,
        routing_config: RoutingConfig,
        sink: BoxedSink,
    ) -> Result<Self, ConfigError> {
        routing_config.validate()?;
        let routing_config = Arc::new(routing_config);
        let store = Arc::new(ChainMetadataStore::new());

        let entries: HashMap<String, UpstreamEntry> =
            entries.into_iter().map(|e| (e.config.id.clone(), e)).collect();
        let entries = Arc::new(entries);

        let built = futures::future::try_join_all(entries.values().map(|entry| {
            let routing_config = routing_config.clone();
            let store = store.clone();
            let sink = sink.clone();
            async move {
                let status = Self::build_status(entry, routing_config, store, sink).await?;
                Ok::<_, ConfigError>((entry.config.id.clone(), Arc::new(status)))
            }
        }))
        .await?;
        let statuses: HashMap<String, Arc<UpstreamStatus>> = built.into_iter().collect();

        Ok(Self {
            store,
            routing_config,
            statuses: Arc::new(RwLock::new(statuses)),
            entries,
            running: Arc::new(AtomicBool::new(false)),
            shutdown: Arc::new(Notify::new()),
            driver: RwLock::new(None),
        })
    }

    async fn build_status(
        entry: &UpstreamEntry,
        routing_config: Arc<RoutingConfig>,
        store: Arc<ChainMetadataStore>,
        sink: BoxedSink,
    ) -> Result<UpstreamStatus, ConfigError> {
        let (block_height_checker, peer_checker, syncing_checker) = tokio::join!(
            BlockHeightChecker::spawn_with_telemetry(
                entry.config.id.clone(),
                entry.client.clone(),
                &entry.config,
                store.clone(),
                sink.clone(),
            ),
            PeerChecker::with_telemetry(entry.client.as_ref(), &entry.config, sink.clone()),
            SyncingChecker::with_telemetry(entry.client.as_ref(), &entry.config, sink.clone()),
        );
        let error_latency_checker = ErrorLatencyChecker::with_telemetry(
            routing_config.clone(),
            true,
            routing_config.passive_latency_checking,
            entry.config.id.clone(),
            sink,
        )?;

        Ok(UpstreamStatus {
            id: entry.config.id.clone(),
            group_id: entry.config.group_id.clone(),
            block_height_checker,
            peer_checker,
            syncing_checker,
            error_latency_checker,
        })
    }

    pub fn status(&self, id: &str) -> Option<Arc<UpstreamStatus>> {
        self.statuses.read().unwrap().get(id).cloned()
    }

    /// Idempotent: a second call while already running is a no-op.
    pub fn start(self: &Arc<Self>) {
        self.start_with_ticker(|| TokioTicker::new(DEFAULT_TICK_INTERVAL));
    }

    /// Test seam: the manager is parametrized on a ticker factory so tests
    /// can drive ticks deterministically instead of waiting on real time.
    pub fn start_with_ticker<F, T>(self: &Arc<Self>, make_ticker: F)
    where
        F: FnOnce() -> T + Send + 'static,
        T: Ticker + 'static,
    {
        if self.running.swap(true, Ordering::AcqRel) {
            return;
        }
        let manager = self.clone();
        let shutdown = self.shutdown.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = make_ticker();
            loop {
                tokio::select! {
                    _ = ticker.tick() => manager.run_tick().await,
                    _ = shutdown.notified() => break,
                }
            }
        });
        *self.driver.write().unwrap() = Some(handle);
    }

    async fn run_tick(&self) {
        let statuses: Vec<Arc<UpstreamStatus>> = self.statuses.read().unwrap().values().cloned().collect();
        let mut checks = Vec::new();
        for status in statuses {
            let Some(entry) = self.entries.get(&status.id) else { continue };

            let client = entry.client.clone();
            let store = self.store.clone();
            let id = status.id.clone();
            let status_for_height = status.clone();
            checks.push(Box::pin(async move {
                status_for_height.block_height_checker.run_check(&id, client.as_ref(), &store).await;
            }) as std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send>>);

            let client = entry.client.clone();
            let status_for_peer = status.clone();
            checks.push(Box::pin(async move {
                status_for_peer.peer_checker.run_check(client.as_ref()).await;
            }));

            let client = entry.client.clone();
            let status_for_sync = status.clone();
            checks.push(Box::pin(async move {
                status_for_sync.syncing_checker.run_check(client.as_ref()).await;
            }));
        }
        // Dimensions fan out independently; one upstream's slow check never
        // blocks another's tick.
        futures::future::join_all(checks).await;
    }

    /// Stops the periodic loop and waits for the driver task to exit. A
    /// tick already in flight runs to completion (each outbound call is
    /// independently bounded by its own timeout).
    pub async fn shutdown(&self) {
        if !self.running.swap(false, Ordering::AcqRel) {
            return;
        }
        self.shutdown.notify_one();
        if let Some(handle) = self.driver.write().unwrap().take() {
            let _ = handle.await;
        }
    }

    /// Filters `candidates` down to the upstreams currently considered
    /// healthy, preserving input order, skipping unknown IDs, and
    /// collapsing a repeated id to its first occurrence.
    pub fn healthy_upstreams(&self, candidates: &[String]) -> Vec<String> {
        let statuses = self.statuses.read().unwrap();

        let max_height = candidates
            .iter()
            .filter_map(|id| statuses.get(id))
            .filter(|status| status.block_height_checker.error().is_none())
            .map(|status| status.block_height_checker.block_height())
            .max()
            .unwrap_or(0);

        let mut seen = std::collections::HashSet::new();
        candidates
            .iter()
            .filter(|id| {
                statuses.get(*id).is_some_and(|status| {
                    status.is_passing(max_height, self.routing_config.max_block_height_drift)
                })
            })
            .filter(|id| seen.insert(id.as_str()))
            .cloned()
            .collect()
    }
}
