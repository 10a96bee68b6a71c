//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Every breaker produces:
//!     → tracing events (transitions, rejections, classified errors)
//!     → telemetry.rs sink (call outcomes, transitions)
//!         → metrics.rs (counters, gauges via the metrics facade)
//!
//! Consumers:
//!     → Log aggregation (stdout, text or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Telemetry is fire-and-forget; it never influences a call's result

pub mod logging;
pub mod metrics;
pub mod telemetry;

pub use metrics::MetricsTelemetry;
pub use telemetry::{BreakerTelemetry, CallOutcome};
