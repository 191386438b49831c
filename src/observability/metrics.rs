//! Metrics collection and exposition.
//!
//! # Metrics
//! - `forms_submissions_total` (counter): submissions by action, status
//! - `forms_submission_duration_seconds` (histogram): handler latency by action
//! - `forms_rate_limited_total` (counter): rejected by the rate limiter, by action
//! - `forms_rate_limiter_errors_total` (counter): storage failures inside the limiter
//! - `forms_notifications_total` (counter): email attempts by kind, outcome
//!
//! Recording is a no-op until an exporter is installed.

use std::net::SocketAddr;
use std::time::Instant;
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install Prometheus exporter"),
    }
}

pub fn record_submission(action: &'static str, status: u16, start: Instant) {
    ::metrics::counter!(
        "forms_submissions_total",
        "action" => action,
        "status" => status.to_string()
    )
    .increment(1);
    ::metrics::histogram!("forms_submission_duration_seconds", "action" => action)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_rate_limited(action: &str) {
    ::metrics::counter!("forms_rate_limited_total", "action" => action.to_string()).increment(1);
}

pub fn record_rate_limiter_error() {
    ::metrics::counter!("forms_rate_limiter_errors_total").increment(1);
}

pub fn record_notification(kind: &'static str, outcome: &'static str) {
    ::metrics::counter!("forms_notifications_total", "kind" => kind, "outcome" => outcome)
        .increment(1);
}
