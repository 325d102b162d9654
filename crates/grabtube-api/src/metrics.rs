//! Prometheus metrics for the API server.

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::time::Instant;

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> PrometheusHandle {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus recorder")
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "grabtube_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "grabtube_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "grabtube_http_requests_in_flight";

    // Resolution metrics
    pub const RESOLUTIONS_TOTAL: &str = "grabtube_resolutions_total";
    pub const RESOLUTION_FAILURES_TOTAL: &str = "grabtube_resolution_failures_total";

    // Download relay metrics
    pub const DOWNLOADS_TOTAL: &str = "grabtube_downloads_total";
    pub const DOWNLOAD_FAILURES_TOTAL: &str = "grabtube_download_failures_total";

    // Rate limiting metrics
    pub const RATE_LIMIT_HITS_TOTAL: &str = "grabtube_rate_limit_hits_total";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record an accepted resolution, labelled by the persona that produced it.
pub fn record_resolution(client: &str) {
    let labels = [("client", client.to_string())];
    counter!(names::RESOLUTIONS_TOTAL, &labels).increment(1);
}

/// Record a resolution that failed across every persona.
pub fn record_resolution_failure() {
    counter!(names::RESOLUTION_FAILURES_TOTAL).increment(1);
}

/// Record a download relay start.
pub fn record_download(format: &str) {
    let labels = [("format", format.to_string())];
    counter!(names::DOWNLOADS_TOTAL, &labels).increment(1);
}

/// Record a download relay that failed before streaming began.
pub fn record_download_failure() {
    counter!(names::DOWNLOAD_FAILURES_TOTAL).increment(1);
}

/// Record rate limit hit.
pub fn record_rate_limit_hit(endpoint: &str) {
    let labels = [("endpoint", sanitize_path(endpoint))];
    counter!(names::RATE_LIMIT_HITS_TOTAL, &labels).increment(1);
}

/// Collapse SPA fallback paths into one label; API paths are static and
/// pass through unchanged.
fn sanitize_path(path: &str) -> String {
    if path.starts_with("/api/") || path == "/metrics" {
        path.to_string()
    } else {
        "/static".to_string()
    }
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);

    let response = next.run(request).await;

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    let duration = start.elapsed().as_secs_f64();

    record_http_request(&method, &path, status, duration);

    response
}
