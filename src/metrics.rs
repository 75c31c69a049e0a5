//! Prometheus metrics for ResumeStore.
//!
//! Installs a global Prometheus recorder using `metrics-exporter-prometheus`,
//! defines metric name constants, provides an axum middleware for HTTP RED
//! metrics, and exposes the `/metrics` endpoint handler.

use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Instant;

// -- Metric name constants ----------------------------------------------------

/// Total HTTP requests (counter). Labels: method, path, status.
pub const HTTP_REQUESTS_TOTAL: &str = "resumestore_http_requests_total";

/// HTTP request duration in seconds (histogram). Labels: method, path.
pub const HTTP_REQUEST_DURATION_SECONDS: &str = "resumestore_http_request_duration_seconds";

/// Calls against the object store (counter). Labels: operation, status.
pub const STORAGE_OPERATIONS_TOTAL: &str = "resumestore_storage_operations_total";

/// Object store call duration in seconds (histogram). Labels: operation.
pub const STORAGE_OPERATION_DURATION_SECONDS: &str =
    "resumestore_storage_operation_duration_seconds";

/// Bytes written to the object store after normalization (counter). Labels: category.
pub const BYTES_UPLOADED_TOTAL: &str = "resumestore_bytes_uploaded_total";

// -- Global recorder installation ---------------------------------------------

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the global Prometheus metrics recorder. Idempotent -- safe to call
/// multiple times (e.g. in tests).
pub fn init_metrics() -> anyhow::Result<&'static PrometheusHandle> {
    if let Some(handle) = PROMETHEUS_HANDLE.get() {
        return Ok(handle);
    }
    let handle = PrometheusBuilder::new().install_recorder()?;
    Ok(PROMETHEUS_HANDLE.get_or_init(|| handle))
}

/// Register metric descriptions with the global recorder. Call once after
/// `init_metrics()`.
pub fn describe_metrics() {
    describe_counter!(HTTP_REQUESTS_TOTAL, "Total HTTP requests");
    describe_histogram!(
        HTTP_REQUEST_DURATION_SECONDS,
        "HTTP request duration in seconds"
    );
    describe_counter!(
        STORAGE_OPERATIONS_TOTAL,
        "Total object store calls by operation and outcome"
    );
    describe_histogram!(
        STORAGE_OPERATION_DURATION_SECONDS,
        "Object store call duration in seconds"
    );
    describe_counter!(BYTES_UPLOADED_TOTAL, "Total bytes written to the object store");
}

// -- Metrics middleware -------------------------------------------------------

/// Axum middleware that records HTTP RED metrics for every request.
///
/// Excludes `/metrics` from self-instrumentation to avoid feedback loops.
pub async fn metrics_middleware(
    req: Request<axum::body::Body>,
    next: axum::middleware::Next,
) -> Response {
    if req.uri().path() == "/metrics" {
        return next.run(req).await;
    }

    let method = req.method().to_string();
    let path = normalize_path(req.uri().path());

    let start = Instant::now();
    let response = next.run(req).await;
    let duration = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    counter!(HTTP_REQUESTS_TOTAL, "method" => method.clone(), "path" => path, "status" => status).increment(1);
    histogram!(HTTP_REQUEST_DURATION_SECONDS, "method" => method, "path" => path).record(duration);

    response
}

// -- Path normalization -------------------------------------------------------

/// Normalize an actual request path to a route template for metric labels.
///
/// Owner ids and object names would otherwise make the label set unbounded.
fn normalize_path(path: &str) -> &'static str {
    let segments: Vec<&str> = path
        .trim_start_matches('/')
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();
    match segments.as_slice() {
        [] => "/",
        ["health"] => "/health",
        ["openapi.json"] => "/openapi.json",
        ["objects", _, _] => "/objects/{owner}/{category}",
        ["objects", _, _, _] => "/objects/{owner}/{category}/{name}",
        ["folders", ..] => "/folders/{prefix}",
        _ => "other",
    }
}

// -- Metrics endpoint handler -------------------------------------------------

/// `GET /metrics` -- Render Prometheus exposition format text.
pub async fn metrics_handler() -> Response {
    match PROMETHEUS_HANDLE.get() {
        Some(handle) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "metrics are disabled").into_response(),
    }
}

// -- Tests --------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_root() {
        assert_eq!(normalize_path("/"), "/");
    }

    #[test]
    fn test_normalize_path_health() {
        assert_eq!(normalize_path("/health"), "/health");
        assert_eq!(normalize_path("/openapi.json"), "/openapi.json");
    }

    #[test]
    fn test_normalize_path_objects() {
        assert_eq!(
            normalize_path("/objects/u1/pictures"),
            "/objects/{owner}/{category}"
        );
        assert_eq!(
            normalize_path("/objects/u1/resumes/My%20Resume"),
            "/objects/{owner}/{category}/{name}"
        );
    }

    #[test]
    fn test_normalize_path_folders() {
        assert_eq!(normalize_path("/folders/u1"), "/folders/{prefix}");
        assert_eq!(normalize_path("/folders/u1/pictures/"), "/folders/{prefix}");
    }

    #[test]
    fn test_normalize_path_unknown() {
        assert_eq!(normalize_path("/something/else"), "other");
    }
}
