//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Pipeline phases produce:
//!     → logging.rs (structured tracing events, one line each)
//!     → metrics.rs (request counters and latency histograms)
//!
//! Consumers:
//!     → stderr (fmt layer)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Sinks are process-wide and safe for concurrent writes
//! - Response logging is spawned and never delays the response

pub mod logging;
pub mod metrics;
