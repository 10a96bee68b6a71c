//! Breaker error type.

use std::time::Duration;
use thiserror::Error;

/// Errors returned by a guarded call.
///
/// `Open` and `Timeout` originate in the breaker. `Operation` carries the
/// wrapped operation's own error, untouched.
#[derive(Debug, Error)]
pub enum BreakerError<E> {
    /// The circuit rejected the call; the operation was never invoked.
    #[error("circuit breaker '{name}' is open")]
    Open { name: String },

    /// The operation did not settle before the configured deadline.
    #[error("operation guarded by '{name}' timed out after {timeout:?}")]
    Timeout { name: String, timeout: Duration },

    /// The operation itself failed.
    #[error(transparent)]
    Operation(E),
}

impl<E> BreakerError<E> {
    /// True when the breaker refused to run the call.
    ///
    /// Callers map this to "service temporarily unavailable".
    pub fn is_open(&self) -> bool {
        matches!(self, BreakerError::Open { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, BreakerError::Timeout { .. })
    }

    /// Borrow the operation's error, if that is what failed.
    pub fn operation_error(&self) -> Option<&E> {
        match self {
            BreakerError::Operation(e) => Some(e),
            _ => None,
        }
    }

    /// Take the operation's error, if that is what failed.
    pub fn into_operation_error(self) -> Option<E> {
        match self {
            BreakerError::Operation(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_error_display() {
        let err: BreakerError<io::Error> = BreakerError::Open {
            name: "database".into(),
        };
        assert_eq!(err.to_string(), "circuit breaker 'database' is open");
        assert!(err.is_open());

        let err: BreakerError<io::Error> = BreakerError::Timeout {
            name: "database".into(),
            timeout: Duration::from_millis(50),
        };
        assert_eq!(
            err.to_string(),
            "operation guarded by 'database' timed out after 50ms"
        );
        assert!(err.is_timeout());
    }

    #[test]
    fn test_operation_error_passes_through() {
        let err = BreakerError::Operation(io::Error::new(io::ErrorKind::ConnectionReset, "reset"));
        assert_eq!(err.to_string(), "reset");

        let inner = err.into_operation_error().unwrap();
        assert_eq!(inner.kind(), io::ErrorKind::ConnectionReset);
    }
}
