//! Circuit breakers for the CRM backend's unreliable dependencies.

pub mod config;
pub mod observability;
pub mod resilience;

pub use config::{BreakerConfig, ResilienceConfig};
pub use resilience::{
    BreakerError, BreakerRegistry, BreakerStats, CircuitBreaker, CircuitState, DependencyBreaker,
};
