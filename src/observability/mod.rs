//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! forwarder, sessions, registry, http:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout (fmt subscriber)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through HTTP spans, session ID through session spans
//! - Metric calls are no-ops until a recorder is installed

pub mod logging;
pub mod metrics;
