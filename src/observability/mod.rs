//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (lifecycle and pipeline counters)
//!
//! Consumers:
//!     → stdout, or log.path with errors mirrored to stdout
//!     → Prometheus scrape on web_api.http.host:port (metric.collect)
//! ```
//!
//! # Design Decisions
//! - Level comes from quiet/verbose/debug settings, overridable by RUST_LOG
//! - Metrics are cheap and inert unless an exporter is installed

pub mod logging;
pub mod metrics;
