//! Preconfigured breaker profiles.
//!
//! # Profiles
//! - Dependency class (datastores): fast, frequently called; trips early,
//!   recovers quickly, short per-call deadline
//! - External service (third-party APIs): slower, less frequent; tolerates
//!   more failures, waits longer before probing
//!
//! # Design Decisions
//! - Pure construction helpers, no shared state
//! - `custom` validates nothing beyond what `CircuitBreaker::new` enforces

use std::sync::Arc;

use crate::config::{BreakerConfig, ConfigError};
use crate::observability::BreakerTelemetry;
use crate::resilience::circuit_breaker::CircuitBreaker;

/// Settings for a datastore-backed dependency.
pub fn dependency_class_profile(name: &str) -> BreakerConfig {
    BreakerConfig {
        name: name.to_string(),
        failure_threshold: 3,
        success_threshold: 2,
        open_duration_ms: 10_000,
        operation_timeout_ms: Some(5_000),
    }
}

/// Settings for a third-party API dependency.
pub fn external_service_profile(name: &str) -> BreakerConfig {
    BreakerConfig {
        name: name.to_string(),
        failure_threshold: 5,
        success_threshold: 3,
        open_duration_ms: 60_000,
        operation_timeout_ms: Some(30_000),
    }
}

/// Breaker for a datastore-backed dependency.
pub fn for_dependency_class(name: &str) -> Result<CircuitBreaker, ConfigError> {
    CircuitBreaker::new(dependency_class_profile(name))
}

/// Breaker for a third-party API dependency.
pub fn for_external_service(name: &str) -> Result<CircuitBreaker, ConfigError> {
    CircuitBreaker::new(external_service_profile(name))
}

/// Breaker built from arbitrary settings.
pub fn custom(config: BreakerConfig) -> Result<CircuitBreaker, ConfigError> {
    CircuitBreaker::new(config)
}

/// Like [`custom`], reporting to the given telemetry sink.
pub fn custom_with_telemetry(
    config: BreakerConfig,
    telemetry: Arc<dyn BreakerTelemetry>,
) -> Result<CircuitBreaker, ConfigError> {
    CircuitBreaker::with_telemetry(config, telemetry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resilience::CircuitState;
    use std::time::Duration;

    #[test]
    fn test_profiles() {
        let db = for_dependency_class("database").unwrap();
        assert_eq!(db.name(), "database");
        assert_eq!(db.current_state(), CircuitState::Closed);
        assert_eq!(db.config().operation_timeout(), Some(Duration::from_secs(5)));

        let api = for_external_service("mail-provider").unwrap();
        assert!(api.config().failure_threshold > db.config().failure_threshold);
        assert!(api.config().open_duration() > db.config().open_duration());
        assert!(api.config().operation_timeout() > db.config().operation_timeout());
    }

    #[test]
    fn test_empty_name_rejected() {
        assert!(for_dependency_class("").is_err());
    }

    #[test]
    fn test_custom_passes_config_through() {
        let mut config = BreakerConfig::new("crm-search");
        config.failure_threshold = 1;
        config.open_duration_ms = 0;

        let breaker = custom(config.clone()).unwrap();
        assert_eq!(breaker.config(), &config);

        config.success_threshold = 0;
        assert!(custom(config).is_err());
    }
}
