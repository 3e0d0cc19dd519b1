//! Metrics collection and exposition.
//!
//! # Metrics
//! - `access_attempts_total` (counter): remote attempts by endpoint
//! - `access_retries_total` (counter): backoff-and-retry cycles by endpoint
//! - `access_rate_limited_total` (counter): denied admissions by endpoint
//! - `access_quota_store_errors_total` (counter): counter store failures by policy
//! - `access_reveals_total` (counter): reveal outcomes by record type
//! - `access_audit_failures_total` (counter): failed audit calls by record type
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed
//! - Labels never carry subject identifiers or field values

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics recorder"),
    }
}

pub fn record_attempt(endpoint: &str) {
    metrics::counter!("access_attempts_total", "endpoint" => endpoint.to_string()).increment(1);
}

pub fn record_retry(endpoint: &str) {
    metrics::counter!("access_retries_total", "endpoint" => endpoint.to_string()).increment(1);
}

pub fn record_rate_limited(endpoint: &str) {
    metrics::counter!("access_rate_limited_total", "endpoint" => endpoint.to_string()).increment(1);
}

pub fn record_store_error(policy: &'static str) {
    metrics::counter!("access_quota_store_errors_total", "policy" => policy).increment(1);
}

pub fn record_reveal(record_type: &'static str, outcome: &'static str) {
    metrics::counter!(
        "access_reveals_total",
        "record_type" => record_type,
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_audit_failure(record_type: &'static str) {
    metrics::counter!("access_audit_failures_total", "record_type" => record_type).increment(1);
}
