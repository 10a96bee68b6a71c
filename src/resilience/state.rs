//! Circuit state machine.
//!
//! # States
//! - Closed: normal operation, calls pass through
//! - Open: dependency assumed down, calls fail fast until the probe time
//! - Half-Open: one probe at a time tests whether the dependency recovered
//!
//! # State Transitions
//! ```text
//! Closed → Open:     consecutive failures reach failure_threshold
//! Open → Half-Open:  first call at or after next_probe_at (admitted as the probe)
//! Half-Open → Closed: consecutive successes reach success_threshold
//! Half-Open → Open:  any failure
//! ```
//!
//! # Design Decisions
//! - Pure bookkeeping, no locking: `CircuitBreaker` owns a `RuntimeState`
//!   behind one mutex and calls in here inside a single critical section
//! - Admission and the Open → Half-Open transition are one step
//! - Counters reset on every transition
//! - Every transition starts a new epoch; an outcome from a call admitted
//!   in an earlier epoch only updates the lifetime totals

use serde::Serialize;
use std::time::{Duration, SystemTime};
use tokio::time::Instant;

use crate::config::BreakerConfig;

/// Observable circuit state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    /// Label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        }
    }
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A state change, reported to logs and telemetry after the lock is released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: CircuitState,
    pub to: CircuitState,
}

/// Internal state with the data each variant carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Closed,
    Open { next_probe_at: Instant },
    /// `probe` is the id of the probe currently running, if any.
    HalfOpen { probe: Option<u64> },
}

impl Phase {
    fn state(&self) -> CircuitState {
        match self {
            Phase::Closed => CircuitState::Closed,
            Phase::Open { .. } => CircuitState::Open,
            Phase::HalfOpen { .. } => CircuitState::HalfOpen,
        }
    }
}

/// Carried by an admitted call until its outcome is recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Permit {
    /// Epoch the call was admitted in.
    pub epoch: u64,
    /// Set when the call holds the half-open probe slot.
    pub probe: Option<u64>,
}

/// Result of asking the circuit whether a call may run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The call must not run.
    Rejected,
    /// The call may run.
    Admitted {
        permit: Permit,
        transition: Option<Transition>,
    },
}

/// Point-in-time view of a breaker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakerStats {
    pub name: String,
    pub state: CircuitState,
    pub consecutive_failures: u32,
    pub consecutive_successes: u32,
    pub last_failure_at: Option<SystemTime>,
    pub last_success_at: Option<SystemTime>,
    /// Time left before a probe is allowed (only while Open).
    pub next_probe_in: Option<Duration>,
    pub total_requests: u64,
    pub total_failures: u64,
    pub total_successes: u64,
    /// Number of transitions into Open, including manual trips.
    pub times_opened: u64,
}

/// Mutable runtime state of one breaker.
#[derive(Debug)]
pub(crate) struct RuntimeState {
    phase: Phase,
    consecutive_failures: u32,
    consecutive_successes: u32,
    last_failure_at: Option<SystemTime>,
    last_success_at: Option<SystemTime>,
    total_requests: u64,
    total_failures: u64,
    total_successes: u64,
    times_opened: u64,
    next_probe_id: u64,
    /// Bumped on every `enter`.
    epoch: u64,
}

impl RuntimeState {
    pub(crate) fn new() -> Self {
        Self {
            phase: Phase::Closed,
            consecutive_failures: 0,
            consecutive_successes: 0,
            last_failure_at: None,
            last_success_at: None,
            total_requests: 0,
            total_failures: 0,
            total_successes: 0,
            times_opened: 0,
            next_probe_id: 0,
            epoch: 0,
        }
    }

    pub(crate) fn state(&self) -> CircuitState {
        self.phase.state()
    }

    /// Count the request and decide whether it runs.
    pub(crate) fn admit(&mut self, now: Instant) -> Admission {
        self.total_requests += 1;

        match self.phase {
            Phase::Closed => Admission::Admitted {
                permit: self.permit(None),
                transition: None,
            },
            Phase::Open { next_probe_at } if now >= next_probe_at => {
                let probe = self.claim_probe_id();
                let transition = self.enter(Phase::HalfOpen { probe: Some(probe) });
                Admission::Admitted {
                    permit: self.permit(Some(probe)),
                    transition,
                }
            }
            Phase::HalfOpen { probe: None } => {
                let probe = self.claim_probe_id();
                self.phase = Phase::HalfOpen { probe: Some(probe) };
                Admission::Admitted {
                    permit: self.permit(Some(probe)),
                    transition: None,
                }
            }
            Phase::Open { .. } | Phase::HalfOpen { probe: Some(_) } => {
                self.total_failures += 1;
                Admission::Rejected
            }
        }
    }

    /// Record a successful call.
    pub(crate) fn on_success(
        &mut self,
        config: &BreakerConfig,
        permit: Permit,
    ) -> Option<Transition> {
        self.total_successes += 1;
        self.last_success_at = Some(SystemTime::now());
        self.release_probe_slot(permit.probe);

        if permit.epoch != self.epoch {
            return None;
        }

        match self.phase {
            Phase::Closed => {
                self.consecutive_failures = 0;
                None
            }
            Phase::HalfOpen { .. } => {
                self.consecutive_successes += 1;
                if self.consecutive_successes >= config.success_threshold {
                    self.enter(Phase::Closed)
                } else {
                    None
                }
            }
            Phase::Open { .. } => None,
        }
    }

    /// Record a failed call (operation error or timeout).
    pub(crate) fn on_failure(
        &mut self,
        config: &BreakerConfig,
        permit: Permit,
        now: Instant,
    ) -> Option<Transition> {
        self.total_failures += 1;
        self.last_failure_at = Some(SystemTime::now());
        self.release_probe_slot(permit.probe);

        if permit.epoch != self.epoch {
            return None;
        }

        match self.phase {
            Phase::Closed => {
                self.consecutive_failures += 1;
                if self.consecutive_failures >= config.failure_threshold {
                    self.open(config, now)
                } else {
                    None
                }
            }
            Phase::HalfOpen { .. } => self.open(config, now),
            Phase::Open { .. } => None,
        }
    }

    /// Free the probe slot of a probe that ended without an outcome.
    pub(crate) fn abandon_probe(&mut self, probe: u64) {
        self.release_probe_slot(Some(probe));
    }

    /// Force Closed with zeroed counters.
    pub(crate) fn force_closed(&mut self) -> Option<Transition> {
        self.enter(Phase::Closed)
    }

    /// Force Open with a fresh probe time.
    pub(crate) fn force_open(
        &mut self,
        config: &BreakerConfig,
        now: Instant,
    ) -> Option<Transition> {
        self.open(config, now)
    }

    pub(crate) fn snapshot(&self, name: &str, now: Instant) -> BreakerStats {
        let next_probe_in = match self.phase {
            Phase::Open { next_probe_at } => Some(next_probe_at.saturating_duration_since(now)),
            _ => None,
        };

        BreakerStats {
            name: name.to_string(),
            state: self.state(),
            consecutive_failures: self.consecutive_failures,
            consecutive_successes: self.consecutive_successes,
            last_failure_at: self.last_failure_at,
            last_success_at: self.last_success_at,
            next_probe_in,
            total_requests: self.total_requests,
            total_failures: self.total_failures,
            total_successes: self.total_successes,
            times_opened: self.times_opened,
        }
    }

    fn open(&mut self, config: &BreakerConfig, now: Instant) -> Option<Transition> {
        let transition = self.enter(Phase::Open {
            next_probe_at: now + config.open_duration(),
        });
        if transition.is_some() {
            self.times_opened += 1;
        }
        transition
    }

    /// Move to `next`, clearing both consecutive counters and starting a new
    /// epoch. Returns a transition only when the observable state changed.
    fn enter(&mut self, next: Phase) -> Option<Transition> {
        let from = self.phase.state();
        self.phase = next;
        self.epoch = self.epoch.wrapping_add(1);
        self.consecutive_failures = 0;
        self.consecutive_successes = 0;

        let to = next.state();
        (from != to).then_some(Transition { from, to })
    }

    fn permit(&self, probe: Option<u64>) -> Permit {
        Permit {
            epoch: self.epoch,
            probe,
        }
    }

    fn claim_probe_id(&mut self) -> u64 {
        self.next_probe_id = self.next_probe_id.wrapping_add(1);
        self.next_probe_id
    }

    fn release_probe_slot(&mut self, probe: Option<u64>) {
        if let (Phase::HalfOpen { probe: Some(running) }, Some(finished)) = (self.phase, probe) {
            if running == finished {
                self.phase = Phase::HalfOpen { probe: None };
            }
        }
    }
}
