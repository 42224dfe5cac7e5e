//! Metrics collection and exposition.
//!
//! # Metrics
//! - `guard_requests_total` (counter): decisions by endpoint class, status
//! - `guard_rejections_total` (counter): rejections by reason
//! - `guard_rate_limited_total` (counter): 429s by endpoint class
//! - `guard_security_alerts_total` (counter): signature matches
//! - `guard_decision_duration_seconds` (histogram): pipeline latency
//!
//! # Design Decisions
//! - Low-overhead updates; labels limited to bounded sets (class, reason,
//!   status) so cardinality stays flat

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on its own listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter started"),
        Err(e) => tracing::error!(error = %e, "Failed to start metrics exporter"),
    }
}

pub fn record_decision(class: &str, status: u16, start: Instant) {
    metrics::counter!(
        "guard_requests_total",
        "class" => class.to_string(),
        "status" => status.to_string(),
    )
    .increment(1);
    metrics::histogram!("guard_decision_duration_seconds", "class" => class.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_rejection(reason: &'static str) {
    metrics::counter!("guard_rejections_total", "reason" => reason).increment(1);
}

pub fn record_rate_limited(class: &str) {
    metrics::counter!("guard_rate_limited_total", "class" => class.to_string()).increment(1);
}

pub fn record_security_alert(signature: &str) {
    metrics::counter!("guard_security_alerts_total", "signature" => signature.to_string())
        .increment(1);
}
