//! Shared utilities for breaker integration and stress tests.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;

use crm_breaker::config::BreakerConfig;
use crm_breaker::observability::{BreakerTelemetry, CallOutcome};
use crm_breaker::resilience::factory;
use crm_breaker::{CircuitBreaker, CircuitState};

/// Error produced by the stub operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("connection refused")]
pub struct StubError;

/// Telemetry sink that remembers every event.
#[derive(Default)]
pub struct RecordingTelemetry {
    calls: Mutex<Vec<CallOutcome>>,
    transitions: Mutex<Vec<CircuitState>>,
}

#[allow(dead_code)]
impl RecordingTelemetry {
    pub fn count(&self, outcome: CallOutcome) -> usize {
        self.calls.lock().unwrap().iter().filter(|o| **o == outcome).count()
    }

    pub fn transitions(&self) -> Vec<CircuitState> {
        self.transitions.lock().unwrap().clone()
    }
}

impl BreakerTelemetry for RecordingTelemetry {
    fn record_call(&self, _breaker: &str, outcome: CallOutcome) {
        self.calls.lock().unwrap().push(outcome);
    }

    fn record_transition(&self, _breaker: &str, state: CircuitState) {
        self.transitions.lock().unwrap().push(state);
    }
}

/// Build a breaker with a recording sink.
pub fn breaker(
    failure_threshold: u32,
    success_threshold: u32,
    open_duration_ms: u64,
    operation_timeout_ms: Option<u64>,
) -> (CircuitBreaker, Arc<RecordingTelemetry>) {
    let telemetry = Arc::new(RecordingTelemetry::default());
    let config = BreakerConfig {
        name: "test-dependency".into(),
        failure_threshold,
        success_threshold,
        open_duration_ms,
        operation_timeout_ms,
    };
    let breaker = factory::custom_with_telemetry(config, telemetry.clone()).unwrap();
    (breaker, telemetry)
}

/// Stub operation that counts its invocations and fails.
#[allow(dead_code)]
pub async fn failing_op(calls: Arc<AtomicU32>) -> Result<u32, StubError> {
    calls.fetch_add(1, Ordering::SeqCst);
    tokio::task::yield_now().await;
    Err(StubError)
}

/// Stub operation that counts its invocations and succeeds after `delay`.
#[allow(dead_code)]
pub async fn succeeding_op(calls: Arc<AtomicU32>, delay: Duration) -> Result<u32, StubError> {
    let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    Ok(n)
}
