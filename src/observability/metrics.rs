//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_identity_resolutions_total` (counter): by outcome (anonymous, authenticated, invalid)
//! - `gateway_admission_decisions_total` (counter): by tier, outcome, reason
//! - `gateway_provider_failures_total` (counter): by failure kind
//! - `gateway_provider_duration_seconds` (histogram): decision provider latency
//!
//! Recording is a no-op until [`init_metrics`] installs the Prometheus recorder.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::admission::Decision;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_identity(outcome: &'static str) {
    counter!("gateway_identity_resolutions_total", "outcome" => outcome).increment(1);
}

pub fn record_decision(tier: &'static str, decision: &Decision) {
    let (outcome, reason) = match decision {
        Decision::Allow => ("allow", "none"),
        Decision::Deny(reason) => ("deny", reason.as_str()),
    };
    counter!(
        "gateway_admission_decisions_total",
        "tier" => tier,
        "outcome" => outcome,
        "reason" => reason
    )
    .increment(1);
}

pub fn record_provider_failure(kind: &'static str) {
    counter!("gateway_provider_failures_total", "kind" => kind).increment(1);
}

pub fn record_provider_latency(start: Instant) {
    histogram!("gateway_provider_duration_seconds").record(start.elapsed().as_secs_f64());
}
