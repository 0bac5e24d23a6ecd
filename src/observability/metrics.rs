//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define proxy metrics (requests, latency, backend call outcomes)
//! - Expose a Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `range_proxy_requests_total` (counter): requests by method, status, outcome
//! - `range_proxy_request_duration_seconds` (histogram): latency by method
//! - `range_proxy_backend_calls_total` (counter): backend calls by outcome and tier timeout
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed
//! - Outcome labels reuse the error kind names

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one finished client request.
pub fn record_request(method: &str, status: u16, outcome: &'static str, started: Instant) {
    metrics::counter!(
        "range_proxy_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "outcome" => outcome
    )
    .increment(1);

    metrics::histogram!(
        "range_proxy_request_duration_seconds",
        "method" => method.to_string()
    )
    .record(started.elapsed().as_secs_f64());
}

/// Record one backend call and the tier timeout it ran under.
pub fn record_backend_call(outcome: &'static str, timeout: Duration) {
    metrics::counter!(
        "range_proxy_backend_calls_total",
        "outcome" => outcome,
        "timeout_secs" => timeout.as_secs().to_string()
    )
    .increment(1);
}
