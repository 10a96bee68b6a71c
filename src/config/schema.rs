//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the breakers.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::resilience::factory;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ResilienceConfig {
    /// Logging and metrics settings.
    pub observability: ObservabilityConfig,

    /// The database dependency and its breaker.
    pub database: DependencyConfig,

    /// Additional named breakers (external services and the like).
    pub breakers: Vec<BreakerConfig>,
}

/// Settings for a single breaker.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BreakerConfig {
    /// Breaker identifier for logging/metrics. Unique per dependency.
    pub name: String,

    /// Consecutive failures while Closed before opening.
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,

    /// Consecutive successes while Half-Open before closing.
    #[serde(default = "default_success_threshold")]
    pub success_threshold: u32,

    /// How long the circuit stays Open before a probe, in milliseconds.
    #[serde(default = "default_open_duration_ms")]
    pub open_duration_ms: u64,

    /// Per-call deadline in milliseconds. Absent or 0 disables it.
    #[serde(default)]
    pub operation_timeout_ms: Option<u64>,
}

fn default_failure_threshold() -> u32 {
    5
}

fn default_success_threshold() -> u32 {
    2
}

fn default_open_duration_ms() -> u64 {
    30_000
}

impl BreakerConfig {
    /// Config with default thresholds and no timeout.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            failure_threshold: default_failure_threshold(),
            success_threshold: default_success_threshold(),
            open_duration_ms: default_open_duration_ms(),
            operation_timeout_ms: None,
        }
    }

    pub fn open_duration(&self) -> Duration {
        Duration::from_millis(self.open_duration_ms)
    }

    /// The per-call deadline, if one applies.
    pub fn operation_timeout(&self) -> Option<Duration> {
        match self.operation_timeout_ms {
            Some(0) | None => None,
            Some(ms) => Some(Duration::from_millis(ms)),
        }
    }
}

/// A dependency guarded by one shared breaker.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DependencyConfig {
    /// Breaker settings for the dependency.
    pub breaker: BreakerConfig,

    /// Case-insensitive substrings identifying expected business-rule errors.
    pub expected_error_patterns: Vec<String>,
}

impl Default for DependencyConfig {
    fn default() -> Self {
        Self {
            breaker: factory::dependency_class_profile("database"),
            expected_error_patterns: default_expected_patterns(),
        }
    }
}

/// Error fragments a healthy datastore returns when it rejects bad input.
pub fn default_expected_patterns() -> Vec<String> {
    [
        "unique constraint",
        "duplicate key",
        "foreign key constraint",
        "violates not-null constraint",
        "not found",
        "no rows",
        "validation",
    ]
    .iter()
    .map(|p| p.to_string())
    .collect()
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level or filter directive (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON lines.
    pub json_logs: bool,

    /// Enable the Prometheus scrape endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_zero_disables_deadline() {
        let mut config = BreakerConfig::new("db");
        assert_eq!(config.operation_timeout(), None);

        config.operation_timeout_ms = Some(0);
        assert_eq!(config.operation_timeout(), None);

        config.operation_timeout_ms = Some(50);
        assert_eq!(config.operation_timeout(), Some(Duration::from_millis(50)));
    }

    #[test]
    fn test_parse_minimal_toml() {
        let config: ResilienceConfig = toml::from_str(
            r#"
            [database]
            expected_error_patterns = ["unique constraint"]

            [[breakers]]
            name = "payments-api"
            failure_threshold = 4
            operation_timeout_ms = 2500
            "#,
        )
        .unwrap();

        assert_eq!(config.database.breaker.name, "database");
        assert_eq!(config.database.expected_error_patterns, vec!["unique constraint"]);
        assert_eq!(config.breakers.len(), 1);
        assert_eq!(config.breakers[0].failure_threshold, 4);
        assert_eq!(config.breakers[0].success_threshold, 2);
        assert_eq!(config.breakers[0].open_duration_ms, 30_000);
        assert_eq!(
            config.breakers[0].operation_timeout(),
            Some(Duration::from_millis(2500))
        );
        assert_eq!(config.observability.log_level, "info");
    }
}
