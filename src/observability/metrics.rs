//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by method, status, environment
//! - `gateway_request_duration_seconds` (histogram): latency distribution
//! - `gateway_ownership_checks_total` (counter): checks by environment, outcome
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed, so tests need no setup
//! - `environment` is `none` when the request never reached a backend

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record a finished request.
pub fn record_request(method: &str, status: u16, environment: &str, start: Instant) {
    counter!(
        "gateway_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "environment" => environment.to_string()
    )
    .increment(1);

    histogram!(
        "gateway_request_duration_seconds",
        "method" => method.to_string(),
        "environment" => environment.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

/// Record one ownership check outcome (`owned`, `denied`, `failed`).
pub fn record_ownership_check(environment: &str, outcome: &'static str) {
    counter!(
        "gateway_ownership_checks_total",
        "environment" => environment.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}
