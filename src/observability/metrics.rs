//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): requests by method, status, target
//! - `proxy_request_duration_seconds` (histogram): latency by method, target
//! - `proxy_body_encryption_total` (counter): body transforms by outcome

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder with its own HTTP listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one completed (or failed) proxied request.
pub fn record_request(method: &str, status: u16, target: &str, start: Instant) {
    metrics::counter!(
        "proxy_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "target" => target.to_string()
    )
    .increment(1);

    metrics::histogram!(
        "proxy_request_duration_seconds",
        "method" => method.to_string(),
        "target" => target.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

/// Record the outcome of a body transform: "encrypted", "unchanged" or "failed".
pub fn record_encryption(target: &str, outcome: &'static str) {
    metrics::counter!(
        "proxy_body_encryption_total",
        "target" => target.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}
