//! Prometheus metrics

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub const REQUESTS_TOTAL: &str = "paws_requests_total";
pub const ERRORS_TOTAL: &str = "paws_errors_total";
pub const REQUEST_DURATION_SECONDS: &str = "paws_request_duration_seconds";

/// Install the global Prometheus recorder.
///
/// Can only succeed once per process.
pub fn init_prometheus_recorder() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    metrics::describe_counter!(REQUESTS_TOTAL, "PAWS and admin requests by method");
    metrics::describe_counter!(ERRORS_TOTAL, "Failed requests by method and status code");
    metrics::describe_histogram!(REQUEST_DURATION_SECONDS, "Request latency by method");
    Ok(handle)
}

pub fn record_request(method: &'static str, elapsed_secs: f64) {
    metrics::counter!(REQUESTS_TOTAL, "method" => method).increment(1);
    metrics::histogram!(REQUEST_DURATION_SECONDS, "method" => method).record(elapsed_secs);
}

pub fn record_error(method: &'static str, code: i32) {
    metrics::counter!(ERRORS_TOTAL, "method" => method, "code" => code.to_string()).increment(1);
}
