//! Tracks health derived from real client traffic: an error-rate breaker
//! plus a per-method latency breaker map, fed by `record_request`.

use crate::circuit_breaker::{ErrorBreaker, LatencyBreaker};
use crate::config::RoutingConfig;
use crate::error::ConfigError;
use crate::telemetry::{BoxedSink, BreakerKind};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// One JSON-RPC sub-response's error, if any. A batch request yields one
/// sub-response per call; a single request yields exactly one.
#[derive(Debug, Clone, Default)]
pub struct SubResponseError {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct JsonRpcResponse {
    pub sub_responses: Vec<Option<SubResponseError>>,
}

impl JsonRpcResponse {
    pub fn get_sub_responses(&self) -> &[Option<SubResponseError>] {
        &self.sub_responses
    }
}

/// One observed client request/response pair, as forwarded by the ingress
/// handler after it proxies the call to an upstream.
#[derive(Debug, Clone)]
pub struct RequestData {
    pub method: String,
    pub http_response_code: u16,
    pub response_body: Option<JsonRpcResponse>,
    pub error: Option<String>,
    pub latency: Duration,
}

/// Fleet-wide default failure-rate threshold for per-method latency
/// breakers. Distinct from `config.errors.rate`, which governs only the
/// error breaker — the config surface has no per-fleet latency-rate field,
/// so this is the single source both breakers used to share by accident.
const LATENCY_BREAKER_FAILURE_RATE: f64 = 0.5;

/// Classifies `(http_code, jsonrpc_code, message)` against the configured
/// match patterns. Depends only on its arguments and the configured
/// patterns — identical inputs always yield identical outputs.
fn is_error(config: &RoutingConfig, http_code: &str, jsonrpc_code: &str, message: &str) -> bool {
    config.errors.http_codes.matches(http_code)
        || config.errors.jsonrpc_codes.matches(jsonrpc_code)
        || config.errors.error_strings.iter().any(|pattern| message.contains(pattern.as_str()))
}

#[derive(Debug)]
pub struct ErrorLatencyChecker {
    config: Arc<RoutingConfig>,
    upstream: String,
    sink: BoxedSink,
    error_checking_enabled: bool,
    latency_checking_enabled: bool,
    error_breaker: Option<ErrorBreaker>,
    latency_breakers: RwLock<HashMap<String, Arc<LatencyBreaker>>>,
}

impl ErrorLatencyChecker {
    pub fn new(
        config: Arc<RoutingConfig>,
        error_checking_enabled: bool,
        latency_checking_enabled: bool,
    ) -> Result<Self, ConfigError> {
        Self::with_telemetry(config, error_checking_enabled, latency_checking_enabled, String::new(), BoxedSink::default())
    }

    /// Same as [`Self::new`], but breaker state transitions are reported to
    /// `sink`, labeled with `upstream`.
    pub fn with_telemetry(
        config: Arc<RoutingConfig>,
        error_checking_enabled: bool,
        latency_checking_enabled: bool,
        upstream: impl Into<String>,
        sink: BoxedSink,
    ) -> Result<Self, ConfigError> {
        if !error_checking_enabled && !latency_checking_enabled {
            return Err(ConfigError::NoCheckingEnabled);
        }
        let upstream = upstream.into();
        let error_breaker = error_checking_enabled.then(|| {
            ErrorBreaker::new(config.errors.rate, config.detection_window, config.ban_window)
                .with_telemetry(upstream.clone(), BreakerKind::Error, sink.clone())
        });
        Ok(Self {
            config,
            upstream,
            sink,
            error_checking_enabled,
            latency_checking_enabled,
            error_breaker,
            latency_breakers: RwLock::new(HashMap::new()),
        })
    }

    fn breaker_for(&self, method: &str) -> Arc<LatencyBreaker> {
        if let Some(breaker) = self.latency_breakers.read().unwrap().get(method) {
            return breaker.clone();
        }
        let mut breakers = self.latency_breakers.write().unwrap();
        breakers
            .entry(method.to_string())
            .or_insert_with(|| {
                Arc::new(
                    LatencyBreaker::new(
                        self.config.latency_threshold_for(method),
                        LATENCY_BREAKER_FAILURE_RATE,
                        self.config.detection_window,
                        self.config.ban_window,
                    )
                    .with_telemetry(self.upstream.clone(), method, self.sink.clone()),
                )
            })
            .clone()
    }

    pub fn record_request(&self, data: &RequestData) {
        if self.latency_checking_enabled {
            self.breaker_for(&data.method).record(data.latency);
        }

        if !self.error_checking_enabled {
            return;
        }
        let Some(breaker) = &self.error_breaker else { return };

        let message = data.error.as_deref().unwrap_or("");
        match &data.response_body {
            None => {
                breaker.record(is_error(&self.config, &data.http_response_code.to_string(), "", message));
            }
            Some(_) if data.http_response_code >= 400 => {
                breaker.record(is_error(&self.config, &data.http_response_code.to_string(), "", message));
            }
            Some(body) => {
                for sub in body.get_sub_responses() {
                    if let Some(err) = sub {
                        breaker.record(is_error(&self.config, "", &err.code.to_string(), &err.message));
                    }
                }
            }
        }
    }

    /// `true` unless enhanced routing control is configured and the
    /// fleet-wide error breaker, or one of the requested methods' latency
    /// breakers, is open.
    pub fn is_passing(&self, methods: &[&str]) -> bool {
        if !self.config.enhanced_routing_control_defined {
            return true;
        }
        if let Some(breaker) = &self.error_breaker {
            if breaker.is_open() {
                return false;
            }
        }
        if !self.latency_checking_enabled {
            return true;
        }
        let breakers = self.latency_breakers.read().unwrap();
        for method in methods {
            if let Some(breaker) = breakers.get(*method) {
                if breaker.is_open() {
                    return false;
                }
            }
        }
        true
    }
}
