//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (thresholds >= 1, non-empty names)
//! - Detect duplicate breaker names
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ResilienceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::{BreakerConfig, ResilienceConfig};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("breaker name must not be empty")]
    EmptyName,

    #[error("breaker '{breaker}': {field} must be at least 1")]
    ZeroThreshold {
        breaker: String,
        field: &'static str,
    },

    #[error("breaker name '{0}' is used more than once")]
    DuplicateName(String),

    #[error("invalid metrics address '{0}'")]
    InvalidMetricsAddress(String),
}

/// Check a single breaker's settings.
pub fn validate_breaker(config: &BreakerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.name.trim().is_empty() {
        errors.push(ValidationError::EmptyName);
    }
    if config.failure_threshold == 0 {
        errors.push(ValidationError::ZeroThreshold {
            breaker: config.name.clone(),
            field: "failure_threshold",
        });
    }
    if config.success_threshold == 0 {
        errors.push(ValidationError::ZeroThreshold {
            breaker: config.name.clone(),
            field: "success_threshold",
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Check the whole configuration.
pub fn validate_config(config: &ResilienceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    let breakers = std::iter::once(&config.database.breaker).chain(config.breakers.iter());
    for breaker in breakers {
        if let Err(mut found) = validate_breaker(breaker) {
            errors.append(&mut found);
        }
        if !breaker.name.is_empty() && !seen.insert(breaker.name.as_str()) {
            errors.push(ValidationError::DuplicateName(breaker.name.clone()));
        }
    }

    let observability = &config.observability;
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
