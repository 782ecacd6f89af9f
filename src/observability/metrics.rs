//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define price service metrics (breaker state, rejections, fallbacks, lookups)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `price_breaker_state` (gauge): 0=closed, 1=open, 2=half-open, per breaker
//! - `price_breaker_transitions_total` (counter): state changes by breaker, target state
//! - `price_breaker_rejected_total` (counter): short-circuited calls by breaker
//! - `price_fallbacks_total` (counter): substituted values by breaker, reason
//! - `price_lookup_duration_seconds` (histogram): remote price lookup latency by outcome

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::resilience::circuit_breaker::CircuitState;

/// Install the Prometheus recorder and its scrape listener. Must run inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

fn state_value(state: CircuitState) -> f64 {
    match state {
        CircuitState::Closed => 0.0,
        CircuitState::Open => 1.0,
        CircuitState::HalfOpen => 2.0,
    }
}

pub fn record_breaker_state(breaker: &str, state: CircuitState) {
    gauge!("price_breaker_state", "breaker" => breaker.to_string()).set(state_value(state));
}

pub fn record_breaker_transition(breaker: &str, to: CircuitState) {
    counter!(
        "price_breaker_transitions_total",
        "breaker" => breaker.to_string(),
        "to" => to.as_str()
    )
    .increment(1);
    record_breaker_state(breaker, to);
}

pub fn record_breaker_rejected(breaker: &str) {
    counter!("price_breaker_rejected_total", "breaker" => breaker.to_string()).increment(1);
}

pub fn record_fallback(breaker: &str, reason: &'static str) {
    counter!(
        "price_fallbacks_total",
        "breaker" => breaker.to_string(),
        "reason" => reason
    )
    .increment(1);
}

pub fn record_price_lookup(outcome: &'static str, start: Instant) {
    histogram!("price_lookup_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
}
