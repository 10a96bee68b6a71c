//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define breaker metrics (calls, transitions, state)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `crm_breaker_calls_total` (counter): calls by breaker, outcome
//! - `crm_breaker_transitions_total` (counter): state changes by breaker, new state
//! - `crm_breaker_state` (gauge): 0=closed, 1=half-open, 2=open
//!
//! # Design Decisions
//! - Goes through the `metrics` facade; without an installed recorder every
//!   update is a no-op, so breakers always carry this sink
//! - Labels for breaker name, outcome, state

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;

use crate::observability::telemetry::{BreakerTelemetry, CallOutcome};
use crate::resilience::CircuitState;

/// Install the Prometheus recorder and its HTTP scrape listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Telemetry sink backed by the `metrics` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsTelemetry;

impl BreakerTelemetry for MetricsTelemetry {
    fn record_call(&self, breaker: &str, outcome: CallOutcome) {
        metrics::counter!(
            "crm_breaker_calls_total",
            "breaker" => breaker.to_string(),
            "outcome" => outcome.as_str()
        )
        .increment(1);
    }

    fn record_transition(&self, breaker: &str, state: CircuitState) {
        metrics::counter!(
            "crm_breaker_transitions_total",
            "breaker" => breaker.to_string(),
            "state" => state.as_str()
        )
        .increment(1);

        metrics::gauge!("crm_breaker_state", "breaker" => breaker.to_string())
            .set(state_gauge_value(state));
    }
}

fn state_gauge_value(state: CircuitState) -> f64 {
    match state {
        CircuitState::Closed => 0.0,
        CircuitState::HalfOpen => 1.0,
        CircuitState::Open => 2.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gauge_values() {
        assert_eq!(state_gauge_value(CircuitState::Closed), 0.0);
        assert_eq!(state_gauge_value(CircuitState::HalfOpen), 1.0);
        assert_eq!(state_gauge_value(CircuitState::Open), 2.0);
    }

    #[test]
    fn test_records_without_recorder() {
        let sink = MetricsTelemetry;
        sink.record_call("database", CallOutcome::Rejected);
        sink.record_transition("database", CircuitState::Open);
    }
}
