//! Metrics collection and exposition.
//!
//! # Metrics
//! - `runner_signals_total` (counter): lifecycle events by `signal`
//! - `runner_reloads_total` (counter): reload attempts by `outcome`
//! - `pipeline_batches_total` (counter): batches taken by `pipeline`
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed
//! - The exporter is opt-in through `metric.collect`

use std::net::SocketAddr;
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

pub const SIGNALS_TOTAL: &str = "runner_signals_total";
pub const RELOADS_TOTAL: &str = "runner_reloads_total";
pub const BATCHES_TOTAL: &str = "pipeline_batches_total";

/// Install the Prometheus exporter with an HTTP listener on `addr`.
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_signal(signal: &'static str) {
    metrics::counter!(SIGNALS_TOTAL, "signal" => signal).increment(1);
}

pub fn record_reload(success: bool) {
    let outcome = if success { "success" } else { "failure" };
    metrics::counter!(RELOADS_TOTAL, "outcome" => outcome).increment(1);
}

pub fn record_batch(pipeline: &str) {
    metrics::counter!(BATCHES_TOTAL, "pipeline" => pipeline.to_string()).increment(1);
}
