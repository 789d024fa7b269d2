//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define gateway metrics (requests, latency, upstream attempts, breakers)
//! - Expose Prometheus-compatible metrics endpoint
//! - Track per-route and per-backend figures
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by route, method, status
//! - `gateway_request_duration_seconds` (histogram): latency distribution
//! - `gateway_upstream_attempts_total` (counter): attempts by service, result
//! - `gateway_fallback_total` (counter): fallback responses by service
//! - `gateway_auth_rejections_total` (counter): 401s by token status
//! - `gateway_circuit_breaker_state` (gauge): 0=closed, 1=half-open, 2=open
//! - `gateway_backend_health` (gauge): 1=healthy, 0=unhealthy
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed, so library users
//!   and tests pay nothing
//! - Requests are labelled by route id, never by raw path, so label
//!   cardinality is bounded by the route table
//! - Requests no route accepts share the route label `unmatched`

use std::net::SocketAddr;
use std::time::Instant;

use ::metrics::Label;
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::auth::TokenStatus;
use crate::resilience::{AttemptResult, CircuitState};

/// Install the Prometheus recorder with an HTTP scrape listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub const UNMATCHED_ROUTE: &str = "unmatched";

/// One request through the gateway, whatever its outcome.
pub fn record_request(route: &str, method: &str, status: u16, start: Instant) {
    let labels = vec![
        Label::new("route", route.to_string()),
        Label::new("method", method.to_string()),
        Label::new("status", status.to_string()),
    ];
    ::metrics::counter!("gateway_requests_total", labels.clone()).increment(1);
    ::metrics::histogram!("gateway_request_duration_seconds", labels)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_upstream_attempt(service: &str, result: &AttemptResult) {
    let result = match result {
        AttemptResult::Response(status) if status.is_server_error() => "server_error",
        AttemptResult::Response(_) => "ok",
        AttemptResult::ConnectError => "connect_error",
        AttemptResult::Timeout => "timeout",
    };
    ::metrics::counter!(
        "gateway_upstream_attempts_total",
        "service" => service.to_string(),
        "result" => result
    )
    .increment(1);
}

pub fn record_fallback(service: &str) {
    ::metrics::counter!("gateway_fallback_total", "service" => service.to_string()).increment(1);
}

pub fn record_auth_rejection(status: TokenStatus) {
    ::metrics::counter!("gateway_auth_rejections_total", "status" => status.as_str()).increment(1);
}

pub fn record_breaker_state(name: &str, state: CircuitState) {
    ::metrics::gauge!("gateway_circuit_breaker_state", "breaker" => name.to_string())
        .set(state.as_gauge());
}

pub fn record_backend_health(service: &str, healthy: bool) {
    ::metrics::gauge!("gateway_backend_health", "service" => service.to_string())
        .set(if healthy { 1.0 } else { 0.0 });
}
