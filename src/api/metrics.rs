//! Prometheus metrics endpoint and HTTP request tracking middleware.

use axum::{
    body::Body,
    extract::{MatchedPath, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::Arc;
use std::time::Instant;

use crate::db::{User, Workout};
use crate::AppState;

// Metric names as constants for consistency
pub const HTTP_REQUESTS_TOTAL: &str = "http_requests_total";
pub const HTTP_REQUEST_DURATION_SECONDS: &str = "http_request_duration_seconds";
pub const SIGNUPS_TOTAL: &str = "fittrack_signups_total";
pub const LOGINS_TOTAL: &str = "fittrack_logins_total";
pub const WORKOUTS_LOGGED_TOTAL: &str = "fittrack_workouts_logged_total";
pub const USERS: &str = "fittrack_users";
pub const WORKOUTS: &str = "fittrack_workouts";

/// Install the Prometheus recorder. Call once at startup.
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    describe_counter!(HTTP_REQUESTS_TOTAL, "Total number of HTTP requests received");
    describe_histogram!(HTTP_REQUEST_DURATION_SECONDS, "HTTP request duration in seconds");
    describe_counter!(SIGNUPS_TOTAL, "Accounts created");
    describe_counter!(LOGINS_TOTAL, "Successful logins");
    describe_counter!(WORKOUTS_LOGGED_TOTAL, "Workouts logged, by type");
    describe_gauge!(USERS, "Registered users");
    describe_gauge!(WORKOUTS, "Stored workouts");

    Ok(handle)
}

/// GET /metrics
pub async fn metrics_endpoint(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    update_gauge_metrics(&state).await;

    match state.metrics_handle.as_ref() {
        Some(h) => (StatusCode::OK, h.render()),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            "Metrics not initialized".to_string(),
        ),
    }
}

async fn update_gauge_metrics(state: &AppState) {
    if let Ok(count) = User::count(&state.db).await {
        gauge!(USERS).set(count as f64);
    }
    if let Ok(count) = Workout::count(&state.db).await {
        gauge!(WORKOUTS).set(count as f64);
    }
}

/// Records `http_requests_total` and `http_request_duration_seconds`
/// labelled by method and matched route.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();

    // Matched path keeps ids out of the label set
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|mp| mp.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let method = request.method().to_string();

    let response = next.run(request).await;

    let duration = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    counter!(HTTP_REQUESTS_TOTAL, "method" => method.clone(), "path" => path.clone(), "status" => status).increment(1);
    histogram!(HTTP_REQUEST_DURATION_SECONDS, "method" => method, "path" => path).record(duration);

    response
}
