//! Circuit breaker for dependency protection.
//!
//! # Responsibilities
//! - Guard every call to one dependency through `execute`
//! - Enforce the per-call timeout
//! - Apply the transition table in `state.rs` and report transitions
//!
//! # Design Decisions
//! - One breaker per logical dependency, shared by cloning (not global)
//! - All reads and writes of the runtime state happen under one mutex,
//!   never held across an `.await`
//! - Fail fast in Open state (no waiting for timeout)
//! - Single probe in Half-Open; a dropped probe frees its slot on drop
//! - Logs and telemetry are emitted after the lock is released

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::time::Instant;

use crate::config::{validation::validate_breaker, BreakerConfig, ConfigError};
use crate::observability::{BreakerTelemetry, CallOutcome, MetricsTelemetry};
use crate::resilience::error::BreakerError;
use crate::resilience::state::{
    Admission, BreakerStats, CircuitState, Permit, RuntimeState, Transition,
};
use crate::resilience::timeouts::{run_with_timeout, DeadlineExceeded};

struct Shared {
    config: BreakerConfig,
    state: Mutex<RuntimeState>,
    telemetry: Arc<dyn BreakerTelemetry>,
}

/// A circuit breaker. Clones share the same state.
#[derive(Clone)]
pub struct CircuitBreaker {
    shared: Arc<Shared>,
}

impl CircuitBreaker {
    /// Create a breaker reporting to the `metrics` facade.
    pub fn new(config: BreakerConfig) -> Result<Self, ConfigError> {
        Self::with_telemetry(config, Arc::new(MetricsTelemetry))
    }

    /// Create a breaker reporting to a custom telemetry sink.
    pub fn with_telemetry(
        config: BreakerConfig,
        telemetry: Arc<dyn BreakerTelemetry>,
    ) -> Result<Self, ConfigError> {
        validate_breaker(&config).map_err(ConfigError::Validation)?;

        tracing::debug!(
            breaker = %config.name,
            failure_threshold = config.failure_threshold,
            success_threshold = config.success_threshold,
            open_duration_ms = config.open_duration_ms,
            operation_timeout_ms = ?config.operation_timeout_ms,
            "Circuit breaker created"
        );

        Ok(Self {
            shared: Arc::new(Shared {
                config,
                state: Mutex::new(RuntimeState::new()),
                telemetry,
            }),
        })
    }

    pub fn name(&self) -> &str {
        &self.shared.config.name
    }

    pub fn config(&self) -> &BreakerConfig {
        &self.shared.config
    }

    /// Run `operation` if the circuit allows it.
    ///
    /// Returns the operation's value unchanged on success. On failure the
    /// operation's own error comes back as [`BreakerError::Operation`];
    /// [`BreakerError::Open`] and [`BreakerError::Timeout`] come from the
    /// breaker itself.
    pub async fn execute<F, Fut, T, E>(&self, operation: F) -> Result<T, BreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let admission = self.lock().admit(Instant::now());

        let permit = match admission {
            Admission::Rejected => {
                tracing::debug!(breaker = %self.name(), "Call rejected: circuit open");
                self.shared.telemetry.record_call(self.name(), CallOutcome::Rejected);
                return Err(BreakerError::Open {
                    name: self.name().to_string(),
                });
            }
            Admission::Admitted { permit, transition } => {
                if let Some(transition) = transition {
                    self.announce(transition);
                }
                permit
            }
        };

        let mut probe_guard = permit.probe.map(|id| ProbeGuard {
            shared: self.shared.as_ref(),
            probe: id,
            armed: true,
        });

        let result = run_with_timeout(self.shared.config.operation_timeout(), operation()).await;

        if let Some(guard) = probe_guard.as_mut() {
            guard.armed = false;
        }

        match result {
            Ok(Ok(value)) => {
                let transition = self.lock().on_success(&self.shared.config, permit);
                self.shared.telemetry.record_call(self.name(), CallOutcome::Success);
                if let Some(transition) = transition {
                    self.announce(transition);
                }
                Ok(value)
            }
            Ok(Err(error)) => {
                self.record_failure(permit);
                Err(BreakerError::Operation(error))
            }
            Err(DeadlineExceeded(timeout)) => {
                tracing::warn!(
                    breaker = %self.name(),
                    timeout = ?timeout,
                    "Guarded operation timed out"
                );
                self.record_failure(permit);
                Err(BreakerError::Timeout {
                    name: self.name().to_string(),
                    timeout,
                })
            }
        }
    }

    /// Force the circuit Closed.
    pub fn reset(&self) {
        let transition = self.lock().force_closed();
        tracing::info!(breaker = %self.name(), "Circuit breaker manually reset");
        if let Some(transition) = transition {
            self.announce(transition);
        }
    }

    /// Force the circuit Open with a fresh probe time.
    pub fn trip(&self) {
        let transition = self.lock().force_open(&self.shared.config, Instant::now());
        tracing::warn!(breaker = %self.name(), "Circuit breaker manually tripped");
        if let Some(transition) = transition {
            self.announce(transition);
        }
    }

    pub fn current_state(&self) -> CircuitState {
        self.lock().state()
    }

    pub fn stats(&self) -> BreakerStats {
        self.lock().snapshot(self.name(), Instant::now())
    }

    fn record_failure(&self, permit: Permit) {
        let transition = self
            .lock()
            .on_failure(&self.shared.config, permit, Instant::now());
        self.shared.telemetry.record_call(self.name(), CallOutcome::Failure);
        if let Some(transition) = transition {
            self.announce(transition);
        }
    }

    fn announce(&self, transition: Transition) {
        match transition.to {
            CircuitState::Open => tracing::warn!(
                breaker = %self.name(),
                from = %transition.from,
                to = %transition.to,
                open_duration_ms = self.shared.config.open_duration_ms,
                "Circuit breaker opened"
            ),
            _ => tracing::info!(
                breaker = %self.name(),
                from = %transition.from,
                to = %transition.to,
                "Circuit breaker state changed"
            ),
        }
        self.shared
            .telemetry
            .record_transition(self.name(), transition.to);
    }

    fn lock(&self) -> MutexGuard<'_, RuntimeState> {
        self.shared.lock()
    }
}

impl Shared {
    // Every mutation completes inside one critical section, so a poisoned
    // lock still guards a consistent state.
    fn lock(&self) -> MutexGuard<'_, RuntimeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("name", &self.shared.config.name)
            .field("state", &self.current_state())
            .finish()
    }
}

/// Holds the half-open probe slot while a probe runs.
///
/// If the `execute` future is dropped mid-probe, the slot is released
/// without recording an outcome.
struct ProbeGuard<'a> {
    shared: &'a Shared,
    probe: u64,
    armed: bool,
}

impl Drop for ProbeGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.shared.lock().abandon_probe(self.probe);
            tracing::debug!(breaker = %self.shared.config.name, "Half-open probe abandoned");
        }
    }
}
