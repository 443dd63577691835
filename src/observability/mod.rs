//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured fields on every event (record id, transaction id, pool)
//! - Metrics are cheap (atomic increments)
//! - Neither key material nor signed payloads ever appear in log output

pub mod logging;
pub mod metrics;
