//! Telemetry sink interface.
//!
//! # Responsibilities
//! - Receive call outcomes and state transitions from every breaker
//!
//! # Design Decisions
//! - Methods return nothing: a sink cannot fail a guarded call
//! - Invoked after the breaker's lock is released
//! - Implementations must not block (increment counters, push to a channel)

use crate::resilience::CircuitState;

/// Outcome of one `execute` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallOutcome {
    Success,
    Failure,
    Rejected,
}

impl CallOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallOutcome::Success => "success",
            CallOutcome::Failure => "failure",
            CallOutcome::Rejected => "rejected",
        }
    }
}

/// Receiver for breaker events.
pub trait BreakerTelemetry: Send + Sync {
    /// Called once per `execute` call.
    fn record_call(&self, breaker: &str, outcome: CallOutcome);

    /// Called once per change of observable state.
    fn record_transition(&self, breaker: &str, state: CircuitState);
}
