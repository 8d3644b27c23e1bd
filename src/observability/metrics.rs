//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): inbound requests by method, status
//! - `gateway_request_duration_seconds` (histogram): inbound latency by method
//! - `gateway_upstream_attempts_total` (counter): outbound attempts by backend, outcome
//! - `gateway_backend_healthy` (gauge): 1=healthy, 0=unhealthy
//! - `gateway_circuit_transitions_total` (counter): circuit state changes by backend, target
//! - `gateway_rate_limited_total` (counter): rejected requests
//! - `gateway_cache_lookups_total` (counter): cache lookups by result
//!
//! # Design Decisions
//! - Recorded through the `metrics` facade; a no-op until an exporter is installed
//! - Prometheus exporter serves its own scrape endpoint

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

use crate::resilience::CircuitState;

/// Install the Prometheus exporter with an HTTP scrape listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    metrics::counter!(
        "gateway_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("gateway_request_duration_seconds", "method" => method.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_upstream_attempt(backend: &str, outcome: &'static str) {
    metrics::counter!(
        "gateway_upstream_attempts_total",
        "backend" => backend.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_backend_health(backend: &str, healthy: bool) {
    metrics::gauge!("gateway_backend_healthy", "backend" => backend.to_string())
        .set(if healthy { 1.0 } else { 0.0 });
}

pub fn record_circuit_transition(backend: &str, to: CircuitState) {
    metrics::counter!(
        "gateway_circuit_transitions_total",
        "backend" => backend.to_string(),
        "to" => to.as_str()
    )
    .increment(1);
}

pub fn record_rate_limited() {
    metrics::counter!("gateway_rate_limited_total").increment(1);
}

pub fn record_cache_lookup(hit: bool) {
    metrics::counter!(
        "gateway_cache_lookups_total",
        "result" => if hit { "hit" } else { "miss" }
    )
    .increment(1);
}
