//! Prometheus metrics for the API server.

use std::sync::OnceLock;
use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use regex_lite::Regex;

/// Install the Prometheus recorder.
/// Returns a handle that renders the exposition for `/metrics`.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "jobvista_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "jobvista_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "jobvista_http_requests_in_flight";

    // Applications
    pub const APPLICATIONS_SUBMITTED_TOTAL: &str = "jobvista_applications_submitted_total";
    pub const APPLICATIONS_DUPLICATE_TOTAL: &str = "jobvista_applications_duplicate_total";

    // Rate limiting metrics
    pub const RATE_LIMIT_HITS_TOTAL: &str = "jobvista_rate_limit_hits_total";
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

pub fn record_application_submitted() {
    counter!(names::APPLICATIONS_SUBMITTED_TOTAL).increment(1);
}

pub fn record_application_duplicate() {
    counter!(names::APPLICATIONS_DUPLICATE_TOTAL).increment(1);
}

/// Record rate limit hit.
pub fn record_rate_limit_hit(endpoint: &str) {
    let labels = [("endpoint", sanitize_path(endpoint))];
    counter!(names::RATE_LIMIT_HITS_TOTAL, &labels).increment(1);
}

fn path_param_patterns() -> &'static [(Regex, &'static str)] {
    static PATTERNS: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            (r"^/(job|update|deleteJob)/[^/]+$", "/$1/:id"),
            (r"^/(myJobs|appliedJobs)/[^/]+$", "/$1/:email"),
        ]
        .into_iter()
        .map(|(pattern, replacement)| {
            (Regex::new(pattern).expect("static pattern is valid"), replacement)
        })
        .collect()
    })
}

/// Collapse path parameters (job ids, emails) so label cardinality stays bounded.
fn sanitize_path(path: &str) -> String {
    for (pattern, replacement) in path_param_patterns() {
        if pattern.is_match(path) {
            return pattern.replace(path, *replacement).into_owned();
        }
    }
    path.to_string()
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
