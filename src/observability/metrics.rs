//! Metrics collection and exposition.
//!
//! # Metrics
//! - `funko_requests_total` (counter): requests by kind and outcome
//! - `funko_request_duration_seconds` (histogram): time from parse to response
//! - `funko_active_connections` (gauge): current connection count
//! - `funko_storage_errors_total` (counter): per-file storage faults by operation
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Start the Prometheus scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to start metrics endpoint"),
    }
}

/// Record one answered request.
pub fn record_request(kind: &'static str, success: bool, start: Instant) {
    let outcome = if success { "success" } else { "failure" };
    counter!("funko_requests_total", "kind" => kind, "outcome" => outcome).increment(1);
    histogram!("funko_request_duration_seconds", "kind" => kind)
        .record(start.elapsed().as_secs_f64());
}

/// Record a request that was refused before it could be dispatched.
///
/// Only counted; there is no meaningful duration to observe.
pub fn record_rejected_request() {
    counter!("funko_requests_total", "kind" => "error", "outcome" => "failure").increment(1);
}

pub fn record_active_connections(count: u64) {
    gauge!("funko_active_connections").set(count as f64);
}

pub fn record_storage_error(op: &'static str) {
    counter!("funko_storage_errors_total", "op" => op).increment(1);
}
