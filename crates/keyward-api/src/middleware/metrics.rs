//! # Request Metrics
//!
//! Records per-request counters and latency through the `metrics` facade.
//! With no recorder installed (tests, `METRICS_ENABLED=false`) the macros
//! are no-ops.

use std::time::Instant;

use axum::extract::{MatchedPath, Request};
use axum::middleware::Next;
use axum::response::Response;

pub const HTTP_REQUESTS_TOTAL: &str = "keyward_http_requests_total";
pub const HTTP_REQUEST_DURATION_SECONDS: &str = "keyward_http_request_duration_seconds";
pub const VERIFICATIONS_TOTAL: &str = "keyward_verifications_total";
pub const LICENSES_ISSUED_TOTAL: &str = "keyward_licenses_issued_total";

/// Middleware that counts requests and records their latency, labelled by
/// method, route template and status.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    // Route template, not the raw URI, to keep label cardinality bounded.
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let started = Instant::now();

    let response = next.run(request).await;

    let status = response.status().as_u16().to_string();
    metrics::counter!(
        HTTP_REQUESTS_TOTAL,
        "method" => method.clone(),
        "route" => route.clone(),
        "status" => status
    )
    .increment(1);
    metrics::histogram!(
        HTTP_REQUEST_DURATION_SECONDS,
        "method" => method,
        "route" => route
    )
    .record(started.elapsed().as_secs_f64());

    response
}

/// Count one verification by outcome.
pub fn record_verification(outcome: &'static str) {
    metrics::counter!(VERIFICATIONS_TOTAL, "outcome" => outcome).increment(1);
}

/// Count one issued license.
pub fn record_issued() {
    metrics::counter!(LICENSES_ISSUED_TOTAL).increment(1);
}
