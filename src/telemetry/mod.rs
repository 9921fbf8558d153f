//! Telemetry for the health-check core.
//!
//! The core never depends on a process-wide metrics or logging singleton
//! beyond the chain metadata store (§9); instead it defines a structured
//! `HealthEvent` and a `TelemetrySink` trait that callers inject. Events
//! flow through `TelemetrySink` implementations — `tower::Service<HealthEvent>`
//! — which can log, aggregate, or forward events to external systems.
//!
//! # Event Types
//!
//! - Breaker transitions: `BreakerOpened`, `BreakerClosed`
//! - Block height: `WsFallback`, `BlockHeightErrorMasked`
//! - Any checker: `MethodNotSupportedLatched`, `CheckTimeout`
//!
//! # Telemetry Sinks
//!
//! `gateway-health-prometheus` and `gateway-health-jsonl` adapt these
//! events for Prometheus counters and JSONL log files, respectively.

pub mod events;
pub mod sinks;

pub use events::{BreakerKind, CheckDimension, HealthEvent};
pub use sinks::{
    emit_best_effort, BoxedSink, ComposedSinkError, FallbackSink, LogSink, MemorySink,
    MulticastSink, NonBlockingSink, NullSink, StreamingSink, TelemetrySink,
};
