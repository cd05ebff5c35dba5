//! Metrics collection and exposition.
//!
//! # Metrics
//! - `strata_requests_total` (counter): requests by method, status
//! - `strata_request_duration_seconds` (histogram): latency by method
//! - `strata_active_connections` (gauge): open client connections
//!
//! Recording is a no-op until a recorder is installed, so library users and
//! tests pay nothing unless [`init_metrics`] ran.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a completed request.
pub fn record_request(method: &str, status: u16, start: Instant) {
    metrics::counter!(
        "strata_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!(
        "strata_request_duration_seconds",
        "method" => method.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn connection_opened() {
    metrics::gauge!("strata_active_connections").increment(1.0);
}

pub fn connection_closed() {
    metrics::gauge!("strata_active_connections").decrement(1.0);
}
