//! Dependency-scoped breaker.
//!
//! # Responsibilities
//! - Hold the one breaker shared by every call site of a dependency
//! - Classify failures as expected (business-rule) or infrastructure
//! - Expose state predicates and manual overrides for operators
//!
//! # Design Decisions
//! - Built once at the composition root and injected; clones share state
//! - Classification only affects logging; the inner breaker has already
//!   counted the failure by the time it runs

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;

use crate::config::{ConfigError, DependencyConfig};
use crate::resilience::circuit_breaker::CircuitBreaker;
use crate::resilience::error::BreakerError;
use crate::resilience::state::{BreakerStats, CircuitState};

/// Kind of failure surfaced by a dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The dependency is healthy and rejected the request (constraint
    /// violation, missing row, validation failure).
    Expected,
    /// The dependency itself is failing (connection loss, timeout, crash).
    Infrastructure,
}

/// Matches error messages against known expected-error fragments.
#[derive(Debug, Clone, Default)]
pub struct ErrorClassifier {
    patterns: Vec<String>,
}

impl ErrorClassifier {
    /// Build a classifier from case-insensitive substrings.
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            patterns: patterns
                .into_iter()
                .map(|p| p.as_ref().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    pub fn classify(&self, message: &str) -> ErrorClass {
        let message = message.to_lowercase();
        if self.patterns.iter().any(|p| message.contains(p.as_str())) {
            ErrorClass::Expected
        } else {
            ErrorClass::Infrastructure
        }
    }
}

/// The shared breaker for one logical dependency.
#[derive(Debug, Clone)]
pub struct DependencyBreaker {
    breaker: CircuitBreaker,
    classifier: Arc<ErrorClassifier>,
}

impl DependencyBreaker {
    pub fn new(breaker: CircuitBreaker, classifier: ErrorClassifier) -> Self {
        Self {
            breaker,
            classifier: Arc::new(classifier),
        }
    }

    pub fn from_config(config: &DependencyConfig) -> Result<Self, ConfigError> {
        let breaker = CircuitBreaker::new(config.breaker.clone())?;
        Ok(Self::new(
            breaker,
            ErrorClassifier::new(&config.expected_error_patterns),
        ))
    }

    /// The database breaker with the default datastore profile.
    pub fn database() -> Result<Self, ConfigError> {
        Self::from_config(&DependencyConfig::default())
    }

    /// Run `operation` through the dependency's breaker.
    pub async fn execute<F, Fut, T, E>(&self, operation: F) -> Result<T, BreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let result = self.breaker.execute(operation).await;
        if let Err(ref error) = result {
            self.log_failure(error);
        }
        result
    }

    /// Classify a failed call. `None` for rejections, which never reached
    /// the dependency.
    pub fn classify<E: Display>(&self, error: &BreakerError<E>) -> Option<ErrorClass> {
        match error {
            BreakerError::Open { .. } => None,
            BreakerError::Timeout { .. } => Some(ErrorClass::Infrastructure),
            BreakerError::Operation(e) => Some(self.classifier.classify(&e.to_string())),
        }
    }

    fn log_failure<E: Display>(&self, error: &BreakerError<E>) {
        let name = self.breaker.name();
        match self.classify(error) {
            None => tracing::debug!(dependency = %name, "Dependency call rejected by open circuit"),
            Some(ErrorClass::Expected) => tracing::info!(
                dependency = %name,
                error = %error,
                "Dependency rejected request (expected error, still counted)"
            ),
            Some(ErrorClass::Infrastructure) => tracing::error!(
                dependency = %name,
                error = %error,
                state = %self.breaker.current_state(),
                "Dependency call failed"
            ),
        }
    }

    pub fn is_open(&self) -> bool {
        self.current_state() == CircuitState::Open
    }

    pub fn is_closed(&self) -> bool {
        self.current_state() == CircuitState::Closed
    }

    pub fn reset(&self) {
        self.breaker.reset();
    }

    pub fn trip(&self) {
        self.breaker.trip();
    }

    pub fn current_state(&self) -> CircuitState {
        self.breaker.current_state()
    }

    pub fn stats(&self) -> BreakerStats {
        self.breaker.stats()
    }

    pub fn name(&self) -> &str {
        self.breaker.name()
    }

    /// The underlying breaker (shares state with this wrapper).
    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BreakerConfig;
    use std::time::Duration;

    fn wrapper(failure_threshold: u32) -> DependencyBreaker {
        let mut config = BreakerConfig::new("database");
        config.failure_threshold = failure_threshold;
        config.open_duration_ms = 60_000;
        DependencyBreaker::new(
            CircuitBreaker::new(config).unwrap(),
            ErrorClassifier::new(["Unique constraint", "not found"]),
        )
    }

    #[test]
    fn test_classifier_is_case_insensitive() {
        let classifier = ErrorClassifier::new(["Unique Constraint", ""]);
        let message = "ERROR: duplicate key violates UNIQUE CONSTRAINT \"clients_email_key\"";
        assert_eq!(classifier.classify(message), ErrorClass::Expected);
        assert_eq!(
            classifier.classify("connection refused"),
            ErrorClass::Infrastructure
        );
    }

    #[tokio::test]
    async fn test_expected_errors_still_count() {
        let db = wrapper(2);

        for _ in 0..2 {
            let err = db
                .execute(|| async { Err::<(), _>("product 42 not found") })
                .await
                .unwrap_err();
            assert_eq!(db.classify(&err), Some(ErrorClass::Expected));
        }

        assert!(db.is_open());
        assert_eq!(db.stats().total_failures, 2);
    }

    #[tokio::test]
    async fn test_classify_breaker_errors() {
        let db = wrapper(1);
        let timeout: BreakerError<String> = BreakerError::Timeout {
            name: "database".into(),
            timeout: Duration::from_millis(5),
        };
        assert_eq!(db.classify(&timeout), Some(ErrorClass::Infrastructure));

        db.trip();
        let err = db
            .execute(|| async { Ok::<_, String>(()) })
            .await
            .unwrap_err();
        assert!(err.is_open());
        assert_eq!(db.classify(&err), None);
    }

    #[test]
    fn test_overrides_and_predicates() {
        let db = wrapper(3);
        let call_site = db.clone();

        assert!(db.is_closed());
        call_site.trip();
        assert!(db.is_open());
        assert!(!db.is_closed());
        db.reset();
        assert!(call_site.is_closed());
    }

    #[test]
    fn test_database_defaults() {
        let db = DependencyBreaker::database().unwrap();
        assert_eq!(db.name(), "database");
        assert_eq!(db.breaker().config().failure_threshold, 3);
    }
}
