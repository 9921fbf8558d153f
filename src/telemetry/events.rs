use std::fmt;
use std::time::Duration;

#[cfg(feature = "telemetry-json")]
use serde_json::json;

/// The dimension a checker event concerns. Distinct from `BreakerKind`,
/// which names the two circuit-breaker flavors the error/latency checker
/// owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckDimension {
    BlockHeight,
    Peer,
    Syncing,
}

impl fmt::Display for CheckDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BlockHeight => write!(f, "block_height"),
            Self::Peer => write!(f, "peer"),
            Self::Syncing => write!(f, "syncing"),
        }
    }
}

/// Which breaker opened or closed: the fleet-wide error breaker, or one
/// method's latency breaker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BreakerKind {
    Error,
    Latency { method: String },
}

impl fmt::Display for BreakerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Latency { method } => write!(f, "latency({method})"),
        }
    }
}

/// Structured events describing state transitions in the health-check
/// core. These are the observable surface a metrics/logging collaborator
/// consumes; the core itself never blocks on delivering one.
#[derive(Debug, Clone, PartialEq)]
pub enum HealthEvent {
    /// A circuit breaker (error or per-method latency) transitioned from
    /// closed to open.
    BreakerOpened { upstream: String, breaker: BreakerKind, failures: u64, total: u64 },
    /// A circuit breaker's ban window elapsed and it returned to closed.
    BreakerClosed { upstream: String, breaker: BreakerKind },
    /// A block-height checker's WS subscription failed; subsequent ticks
    /// fall back to HTTP polling until the subscription recovers.
    WsFallback { upstream: String },
    /// A checker observed "method not supported" and latched its
    /// dimension off permanently for this upstream.
    MethodNotSupportedLatched { upstream: String, dimension: CheckDimension },
    /// The block-height check suppressed a transient error because this
    /// upstream's cached height was already at (or within drift of) the
    /// fleet maximum. Surfaced so the masking is observable rather than
    /// silent, per the design note on this predicate's ambiguity.
    BlockHeightErrorMasked { upstream: String, block_height: u64, max_block_height: u64 },
    /// An outbound check exceeded its bounded timeout.
    CheckTimeout { upstream: String, dimension: CheckDimension, after: Duration },
}

impl fmt::Display for HealthEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BreakerOpened { upstream, breaker, failures, total } => {
                write!(f, "BreakerOpened(upstream={upstream}, breaker={breaker}, {failures}/{total})")
            }
            Self::BreakerClosed { upstream, breaker } => {
                write!(f, "BreakerClosed(upstream={upstream}, breaker={breaker})")
            }
            Self::WsFallback { upstream } => write!(f, "WsFallback(upstream={upstream})"),
            Self::MethodNotSupportedLatched { upstream, dimension } => {
                write!(f, "MethodNotSupportedLatched(upstream={upstream}, dimension={dimension})")
            }
            Self::BlockHeightErrorMasked { upstream, block_height, max_block_height } => write!(
                f,
                "BlockHeightErrorMasked(upstream={upstream}, height={block_height}, max={max_block_height})"
            ),
            Self::CheckTimeout { upstream, dimension, after } => {
                write!(f, "CheckTimeout(upstream={upstream}, dimension={dimension}, after={after:?})")
            }
        }
    }
}

#[cfg_attr(not(feature = "telemetry-json"), allow(dead_code))]
#[inline]
fn clamp_u64(val: u128) -> u64 {
    val.min(u128::from(u64::MAX)) as u64
}

/// Converts a `HealthEvent` into a JSON value for sinks such as
/// `gateway-health-jsonl`.
#[cfg(feature = "telemetry-json")]
pub fn event_to_json(event: &HealthEvent) -> serde_json::Value {
    match event {
        HealthEvent::BreakerOpened { upstream, breaker, failures, total } => json!({
            "kind": "breaker_opened",
            "upstream": upstream,
            "breaker": breaker.to_string(),
            "failures": *failures,
            "total": *total,
        }),
        HealthEvent::BreakerClosed { upstream, breaker } => json!({
            "kind": "breaker_closed",
            "upstream": upstream,
            "breaker": breaker.to_string(),
        }),
        HealthEvent::WsFallback { upstream } => json!({
            "kind": "ws_fallback",
            "upstream": upstream,
        }),
        HealthEvent::MethodNotSupportedLatched { upstream, dimension } => json!({
            "kind": "method_not_supported_latched",
            "upstream": upstream,
            "dimension": dimension.to_string(),
        }),
        HealthEvent::BlockHeightErrorMasked { upstream, block_height, max_block_height } => json!({
            "kind": "block_height_error_masked",
            "upstream": upstream,
            "block_height": *block_height,
            "max_block_height": *max_block_height,
        }),
        HealthEvent::CheckTimeout { upstream, dimension, after } => json!({
            "kind": "check_timeout",
            "upstream": upstream,
            "dimension": dimension.to_string(),
            "after_ms": clamp_u64(after.as_millis()),
        }),
    }
}
