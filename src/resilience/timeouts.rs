//! Timeout enforcement.
//!
//! # Responsibilities
//! - Bound a single guarded call by the breaker's operation timeout
//! - Drop the timer as soon as either branch settles
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Timeout errors are distinct from operation errors
//! - On expiry the wrapped future is dropped; work it already handed off
//!   elsewhere (spawned tasks, server-side queries) is not cancelled

use std::future::Future;
use std::time::Duration;

/// The deadline passed before the future settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeadlineExceeded(pub Duration);

/// Await `future`, bounded by `limit` when one is set.
pub async fn run_with_timeout<F>(
    limit: Option<Duration>,
    future: F,
) -> Result<F::Output, DeadlineExceeded>
where
    F: Future,
{
    match limit {
        Some(limit) => tokio::time::timeout(limit, future)
            .await
            .map_err(|_| DeadlineExceeded(limit)),
        None => Ok(future.await),
    }
}
