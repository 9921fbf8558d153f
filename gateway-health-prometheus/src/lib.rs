//! Prometheus metrics sink for `gateway-health`.
//! Bring your own `prometheus::Registry`; counters are registered and incremented.

use gateway_health::telemetry::{HealthEvent, TelemetrySink};
use prometheus::{IntCounterVec, Registry};
use std::convert::Infallible;
use std::future::{ready, Ready};
use std::sync::Arc;
use std::task::{Context, Poll};

#[derive(Clone, Debug)]
pub struct PrometheusSink {
    registry: Arc<Registry>,
    counter: IntCounterVec,
}

impl PrometheusSink {
    /// Create a sink and register counters into the provided registry.
    ///
    /// # Errors
    /// Returns an error if the metric cannot be registered (e.g. name conflict).
    pub fn new<R: Into<Arc<Registry>>>(registry: R) -> Result<Self, prometheus::Error> {
        let registry = registry.into();
        let counter = IntCounterVec::new(
            prometheus::Opts::new("gateway_health_events_total", "Upstream health events"),
            &["upstream", "kind", "detail"],
        )?;
        registry.register(Box::new(counter.clone()))?;
        Ok(Self { registry, counter })
    }

    /// Expose the registry for HTTP scraping.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl tower_service::Service<HealthEvent> for PrometheusSink {
    type Response = ();
    type Error = Infallible;
    type Future = Ready<Result<(), Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, event: HealthEvent) -> Self::Future {
        let (upstream, kind, detail) = match &event {
            HealthEvent::BreakerOpened { upstream, breaker, .. } => {
                (upstream.clone(), "breaker_opened", breaker.to_string())
            }
            HealthEvent::BreakerClosed { upstream, breaker } => {
                (upstream.clone(), "breaker_closed", breaker.to_string())
            }
            HealthEvent::WsFallback { upstream } => {
                (upstream.clone(), "ws_fallback", String::new())
            }
            HealthEvent::MethodNotSupportedLatched { upstream, dimension } => {
                (upstream.clone(), "method_not_supported_latched", dimension.to_string())
            }
            HealthEvent::BlockHeightErrorMasked { upstream, .. } => {
                (upstream.clone(), "block_height_error_masked", String::new())
            }
            HealthEvent::CheckTimeout { upstream, dimension, .. } => {
                (upstream.clone(), "check_timeout", dimension.to_string())
            }
        };
        self.counter.with_label_values(&[&upstream, kind, &detail]).inc();
        ready(Ok(()))
    }
}

impl TelemetrySink for PrometheusSink {
    type SinkError = Infallible;
}
