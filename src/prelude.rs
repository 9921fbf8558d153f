//! Convenient re-exports for common `gateway-health` types.
pub use crate::{
    chain_client::{ChainClient, Header, Subscription, SyncProgress},
    chain_metadata_store::ChainMetadataStore,
    circuit_breaker::{ErrorBreaker, LatencyBreaker},
    clock::{Clock, MonotonicClock},
    config::{
        BasicAuth, ErrorMatchConfig, HealthCheckConfig, LatencyConfig, MatchPatterns,
        RoutingConfig, UpstreamConfig,
    },
    error::{CheckError, ConfigError},
    error_latency_checker::{ErrorLatencyChecker, JsonRpcResponse, RequestData, SubResponseError},
    manager::{HealthCheckManager, UpstreamEntry},
    sliding_window::SlidingWindow,
    status::UpstreamStatus,
    telemetry::{
        BoxedSink, BreakerKind, CheckDimension, FallbackSink, HealthEvent, LogSink, MemorySink,
        MulticastSink, NullSink, StreamingSink, TelemetrySink,
    },
    ticker::{ManualTickHandle, ManualTicker, Ticker, TokioTicker, DEFAULT_TICK_INTERVAL},
};
