//! Error types for the health-check core.
//!
//! Two distinct taxonomies, matching §7 of the design: construction-time
//! configuration errors are hard failures raised to the caller, while
//! runtime checker errors never propagate — they're captured on
//! `last_error` and surfaced only through accessor methods.

use std::fmt;
use std::time::Duration;

/// Raised when constructing a checker, breaker, or manager from invalid
/// configuration. The core refuses to start rather than run with an
/// under-specified routing config.
#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("detection_window must be greater than zero")]
    ZeroDetectionWindow,
    #[error("ban_window must be greater than zero")]
    ZeroBanWindow,
    #[error("error_rate must be in (0, 1], got {0}")]
    InvalidErrorRate(f64),
    #[error("error/latency checker requires at least one of error-checking or latency-checking enabled")]
    NoCheckingEnabled,
}

/// A transient failure observed while probing an upstream. Never raised:
/// checkers record it on `last_error` and keep going.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckError {
    /// The outbound call did not complete within the bounded timeout.
    Timeout { after: Duration },
    /// The JSON-RPC call returned an error response or the transport failed.
    Rpc { message: String },
    /// The JSON-RPC call returned "method not supported" (code -32601, or a
    /// message containing that phrase). Distinguished from `Rpc` because it
    /// latches the checker off rather than just recording a transient error.
    MethodNotSupported { message: String },
    /// The WebSocket subscription itself failed; recorded only on the block
    /// height checker's WS-specific error slot.
    Subscription { message: String },
}

impl fmt::Display for CheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout { after } => write!(f, "request timed out after {:?}", after),
            Self::Rpc { message } => write!(f, "rpc error: {message}"),
            Self::MethodNotSupported { message } => write!(f, "method not supported: {message}"),
            Self::Subscription { message } => write!(f, "subscription error: {message}"),
        }
    }
}

impl std::error::Error for CheckError {}

impl CheckError {
    pub fn is_method_not_supported(&self) -> bool {
        matches!(self, Self::MethodNotSupported { .. })
    }

    /// JSON-RPC code `-32601`, or a message containing "unsupported method"
    /// (case-insensitive), latches a checker's dimension off permanently.
    pub fn classify(code: Option<i64>, message: &str) -> Self {
        if code == Some(-32601) || message.to_ascii_lowercase().contains("unsupported method") {
            Self::MethodNotSupported { message: message.to_string() }
        } else {
            Self::Rpc { message: message.to_string() }
        }
    }
}
