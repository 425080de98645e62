//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by outcome
//! - `gateway_upstream_errors_total` (counter): upstream failures by kind
//! - `gateway_redirect_hops_total` (counter): upstream redirects followed
//! - `gateway_upstream_duration_seconds` (histogram): time to response head
//! - `gateway_active_relays` (gauge): bodies currently streaming
//!
//! Recording is a no-op until a recorder is installed, so the helpers are
//! safe to call from tests.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to start metrics endpoint"),
    }
}

pub fn record_request(outcome: &'static str) {
    ::metrics::counter!("gateway_requests_total", "outcome" => outcome).increment(1);
}

pub fn record_upstream_error(kind: &'static str) {
    ::metrics::counter!("gateway_upstream_errors_total", "kind" => kind).increment(1);
}

pub fn record_redirect_hop() {
    ::metrics::counter!("gateway_redirect_hops_total").increment(1);
}

pub fn record_upstream_duration(start: Instant) {
    ::metrics::histogram!("gateway_upstream_duration_seconds")
        .record(start.elapsed().as_secs_f64());
}

pub fn set_active_relays(count: u64) {
    ::metrics::gauge!("gateway_active_relays").set(count as f64);
}
