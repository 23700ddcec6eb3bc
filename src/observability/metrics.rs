//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define mesh metrics (requests, breakers, fallbacks, lookups, health)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `billing_mesh_requests_total` (counter): requests by method, status, target
//! - `billing_mesh_request_duration_seconds` (histogram): latency distribution
//! - `billing_mesh_breaker_state` (gauge): 0=closed, 1=open, 2=half-open
//! - `billing_mesh_breaker_transitions_total` (counter): by breaker, from, to
//! - `billing_mesh_fallbacks_total` (counter): by breaker, reason
//! - `billing_mesh_lookups_total` (counter): remote lookups by service, outcome
//! - `billing_mesh_lookup_duration_seconds` (histogram): remote lookup latency
//! - `billing_mesh_instance_health` (gauge): 1=healthy, 0=unhealthy
//!
//! # Design Decisions
//! - Low-overhead metric updates (atomic operations)
//! - Labels for breaker, service, instance, status code

use std::net::SocketAddr;
use std::time::Instant;

use ::metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::resilience::BreakerState;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, target: &str, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("status", status.to_string()),
        ("target", target.to_string()),
    ];
    counter!("billing_mesh_requests_total", &labels).increment(1);
    histogram!("billing_mesh_request_duration_seconds", &labels)
        .record(start.elapsed().as_secs_f64());
}

fn state_value(state: BreakerState) -> f64 {
    match state {
        BreakerState::Closed => 0.0,
        BreakerState::Open => 1.0,
        BreakerState::HalfOpen => 2.0,
    }
}

pub fn record_breaker_state(name: &str, state: BreakerState) {
    gauge!("billing_mesh_breaker_state", "breaker" => name.to_string()).set(state_value(state));
}

pub fn record_breaker_transition(name: &str, from: BreakerState, to: BreakerState) {
    counter!(
        "billing_mesh_breaker_transitions_total",
        "breaker" => name.to_string(),
        "from" => from.as_str(),
        "to" => to.as_str()
    )
    .increment(1);
    record_breaker_state(name, to);
}

/// `reason` is "short_circuit" when the breaker refused the call, "failure" otherwise.
pub fn record_fallback(breaker: &str, reason: &'static str) {
    counter!(
        "billing_mesh_fallbacks_total",
        "breaker" => breaker.to_string(),
        "reason" => reason
    )
    .increment(1);
}

pub fn record_lookup(service: &str, ok: bool, started: Instant) {
    let outcome = if ok { "success" } else { "failure" };
    counter!(
        "billing_mesh_lookups_total",
        "service" => service.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    histogram!("billing_mesh_lookup_duration_seconds", "service" => service.to_string())
        .record(started.elapsed().as_secs_f64());
}

pub fn record_instance_health(instance: &str, healthy: bool) {
    gauge!("billing_mesh_instance_health", "instance" => instance.to_string())
        .set(if healthy { 1.0 } else { 0.0 });
}
