#![forbid(unsafe_code)]

//! # gateway-health
//!
//! The upstream health and routing core for a JSON-RPC blockchain gateway:
//! active health checks (block height, peer count, sync status), passive
//! circuit breakers over real client traffic (error rate, per-method
//! latency), and the healthy-set query the router consumes.
//!
//! ## Features
//!
//! - **Active health checks** over push subscription or HTTP polling, each
//!   tolerant of unsupported methods and transient failures
//! - **Passive circuit breakers** on error rate and per-method latency,
//!   built on a bucketed sliding window
//! - **A health-check manager** that owns upstreams, schedules periodic
//!   checks in parallel, and answers `HealthyUpstreams(candidates)`
//! - **Injected time and telemetry collaborators** — no process-wide
//!   singletons beyond the shared chain metadata store
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gateway_health::chain_client::{ChainClient, Header, SyncProgress, Subscription};
//! use gateway_health::{CheckError, HealthCheckManager, RoutingConfig, UpstreamConfig, UpstreamEntry};
//! use async_trait::async_trait;
//! use std::collections::HashMap;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! struct DemoClient;
//!
//! #[async_trait]
//! impl ChainClient for DemoClient {
//!     async fn header_by_number(&self, _number: Option<u64>) -> Result<Header, CheckError> {
//!         Ok(Header { number: 100 })
//!     }
//!     async fn subscribe_new_heads(&self) -> Result<Subscription, CheckError> {
//!         Err(CheckError::Subscription { message: "no ws configured".into() })
//!     }
//!     async fn peer_count(&self) -> Result<u64, CheckError> {
//!         Ok(12)
//!     }
//!     async fn sync_progress(&self) -> Result<Option<SyncProgress>, CheckError> {
//!         Ok(None)
//!     }
//!     async fn record_latency(&self, _method: &str) -> Result<Duration, CheckError> {
//!         Ok(Duration::from_millis(50))
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let routing_config = RoutingConfig {
//!         detection_window: Duration::from_secs(60),
//!         ban_window: Duration::from_secs(30),
//!         errors: Default::default(),
//!         latency: Default::default(),
//!         passive_latency_checking: true,
//!         is_enabled: true,
//!         max_block_height_drift: 0,
//!         enhanced_routing_control_defined: true,
//!     };
//!
//!     let upstream = UpstreamConfig {
//!         id: "alchemy".into(),
//!         group_id: None,
//!         http_url: "https://example.invalid".into(),
//!         ws_url: None,
//!         basic_auth: None,
//!         request_headers: HashMap::new(),
//!         health_check_config: Default::default(),
//!     };
//!
//!     let manager = Arc::new(
//!         HealthCheckManager::new(
//!             vec![UpstreamEntry { config: upstream, client: Arc::new(DemoClient) }],
//!             routing_config,
//!         )
//!         .await
//!         .expect("valid routing config"),
//!     );
//!
//!     manager.start();
//!     let healthy = manager.healthy_upstreams(&["alchemy".to_string()]);
//!     println!("{healthy:?}");
//!     manager.shutdown().await;
//! }
//! ```

pub mod chain_client;
pub mod chain_metadata_store;
mod circuit_breaker;
mod clock;
pub mod config;
mod error;
mod error_latency_checker;
mod block_height_checker;
mod manager;
mod peer_checker;
mod sliding_window;
mod status;
mod syncing_checker;
pub mod telemetry;
mod ticker;
mod timeout;

// Re-exports
pub use block_height_checker::BlockHeightChecker;
pub use chain_metadata_store::ChainMetadataStore;
pub use circuit_breaker::{ErrorBreaker, LatencyBreaker};
pub use clock::{Clock, MonotonicClock};
pub use config::{RoutingConfig, UpstreamConfig};
pub use error::{CheckError, ConfigError};
pub use error_latency_checker::{ErrorLatencyChecker, JsonRpcResponse, RequestData, SubResponseError};
pub use manager::{HealthCheckManager, UpstreamEntry};
pub use peer_checker::{PeerChecker, MIN_PEERS};
pub use sliding_window::SlidingWindow;
pub use status::UpstreamStatus;
pub use syncing_checker::SyncingChecker;
pub use ticker::{ManualTickHandle, ManualTicker, Ticker, TokioTicker, DEFAULT_TICK_INTERVAL};

pub mod prelude;
