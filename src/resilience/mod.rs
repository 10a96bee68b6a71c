//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Call to a dependency:
//!     → dependency.rs (shared per-dependency breaker, classifies failures)
//!     → circuit_breaker.rs (admit or reject, record outcome)
//!         → state.rs (transition table)
//!         → timeouts.rs (per-call deadline)
//!
//! Construction:
//!     factory.rs (profiles) → registry.rs (one breaker per name)
//! ```
//!
//! # Design Decisions
//! - Every guarded call has an optional deadline
//! - Circuit breaker prevents cascading failures
//! - Failures are aggregated per dependency, not per call site
//! - The breaker never swallows or rewrites an operation's error

pub mod circuit_breaker;
pub mod dependency;
pub mod error;
pub mod factory;
pub mod registry;
pub mod state;
pub mod timeouts;

pub use circuit_breaker::CircuitBreaker;
pub use dependency::{DependencyBreaker, ErrorClass, ErrorClassifier};
pub use error::BreakerError;
pub use registry::{BreakerRegistry, RegistryError};
pub use state::{BreakerStats, CircuitState};
