//! Configuration surface consumed by the health-check core.
//!
//! File parsing, env overlays, and secret resolution all live in the
//! ingress binary; this module only defines the shapes and validates them.

use crate::error::ConfigError;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

fn default_true() -> bool {
    true
}

/// One configured upstream node provider.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    pub id: String,
    #[serde(default)]
    pub group_id: Option<String>,
    pub http_url: String,
    #[serde(default)]
    pub ws_url: Option<String>,
    #[serde(default)]
    pub basic_auth: Option<BasicAuth>,
    #[serde(default)]
    pub request_headers: HashMap<String, String>,
    #[serde(default)]
    pub health_check_config: HealthCheckConfig,
}

impl UpstreamConfig {
    /// Whether the block height checker should take the WS path: a ws_url
    /// is configured and `use_ws_for_block_height` wasn't explicitly turned
    /// off.
    pub fn use_ws_for_block_height(&self) -> bool {
        self.ws_url.is_some() && self.health_check_config.use_ws_for_block_height.unwrap_or(true)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BasicAuth {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HealthCheckConfig {
    #[serde(default)]
    pub use_ws_for_block_height: Option<bool>,
    #[serde(default)]
    pub skip_peer_count_check: bool,
}

/// Wildcard error-match patterns: `X`/`x` (case-insensitive) matches any
/// character at that position; pattern and candidate must be equal length.
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct MatchPatterns(pub Vec<String>);

impl MatchPatterns {
    /// An empty pattern list matches any non-empty candidate ("match-all");
    /// an empty candidate never matches anything.
    pub fn matches(&self, candidate: &str) -> bool {
        if candidate.is_empty() {
            return false;
        }
        if self.0.is_empty() {
            return true;
        }
        self.0.iter().any(|pattern| wildcard_eq(pattern, candidate))
    }
}

fn wildcard_eq(pattern: &str, candidate: &str) -> bool {
    if pattern.len() != candidate.len() {
        return false;
    }
    pattern.chars().zip(candidate.chars()).all(|(p, c)| {
        matches!(p, 'X' | 'x') || p.eq_ignore_ascii_case(&c)
    })
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorMatchConfig {
    #[serde(default)]
    pub rate: f64,
    #[serde(default)]
    pub http_codes: MatchPatterns,
    #[serde(default)]
    pub jsonrpc_codes: MatchPatterns,
    /// Case-sensitive substrings; a response message containing any one of
    /// these is classified as an error.
    #[serde(default)]
    pub error_strings: Vec<String>,
}

impl Default for ErrorMatchConfig {
    fn default() -> Self {
        Self { rate: 0.0, http_codes: MatchPatterns(Vec::new()), jsonrpc_codes: MatchPatterns(Vec::new()), error_strings: Vec::new() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LatencyConfig {
    #[serde(with = "humantime_millis", default = "default_latency_threshold")]
    pub threshold: Duration,
    #[serde(default)]
    pub method_latency_thresholds: HashMap<String, DurationMillis>,
}

impl Default for LatencyConfig {
    fn default() -> Self {
        Self { threshold: default_latency_threshold(), method_latency_thresholds: HashMap::new() }
    }
}

fn default_latency_threshold() -> Duration {
    Duration::from_secs(5)
}

/// Deserializes a bare millisecond integer into a `Duration`. The fleet's
/// config files carry raw millisecond counts, not ISO-8601 durations.
mod humantime_millis {
    use super::*;
    use serde::Deserializer;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

/// Newtype so `method_latency_thresholds` can deserialize from a bare
/// millisecond integer while still exposing a `Duration` to callers.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(transparent)]
pub struct DurationMillis(pub u64);

impl DurationMillis {
    pub fn as_duration(self) -> Duration {
        Duration::from_millis(self.0)
    }
}

/// Fleet-wide routing and detection parameters, shared across upstreams.
#[derive(Debug, Clone, Deserialize)]
pub struct RoutingConfig {
    #[serde(with = "humantime_millis")]
    pub detection_window: Duration,
    #[serde(with = "humantime_millis")]
    pub ban_window: Duration,
    #[serde(default)]
    pub errors: ErrorMatchConfig,
    #[serde(default)]
    pub latency: LatencyConfig,
    #[serde(default)]
    pub passive_latency_checking: bool,
    #[serde(default = "default_true")]
    pub is_enabled: bool,
    /// Generalizes the fleet-max block height comparison: an upstream may
    /// trail the observed fleet maximum by up to this many blocks and still
    /// be considered at parity. Defaults to 0 (must equal the fleet max),
    /// matching the original strict comparison.
    #[serde(default)]
    pub max_block_height_drift: u64,
    /// Whether passive error/latency gating participates in `is_passing`
    /// queries at all ("enhanced routing control").
    #[serde(default)]
    pub enhanced_routing_control_defined: bool,
}

impl RoutingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.detection_window.is_zero() {
            return Err(ConfigError::ZeroDetectionWindow);
        }
        if self.ban_window.is_zero() {
            return Err(ConfigError::ZeroBanWindow);
        }
        if !(self.errors.rate > 0.0 && self.errors.rate <= 1.0) {
            return Err(ConfigError::InvalidErrorRate(self.errors.rate));
        }
        Ok(())
    }

    pub fn latency_threshold_for(&self, method: &str) -> Duration {
        self.latency
            .method_latency_thresholds
            .get(method)
            .map(|d| d.as_duration())
            .unwrap_or(self.latency.threshold)
    }
}
