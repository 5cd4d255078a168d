//! Request spans, HTTP metrics, response hardening and the Prometheus scrape.

use axum::{
    extract::{MatchedPath, Request, State},
    http::{HeaderName, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{Instrument, Span, info, info_span};
use uuid::Uuid;

use super::{ApiError, AppState};

const SECURITY_HEADERS: [(&str, &str); 4] = [
    ("x-content-type-options", "nosniff"),
    ("x-frame-options", "DENY"),
    ("referrer-policy", "strict-origin-when-cross-origin"),
    // Responses carry tokens and user records
    ("cache-control", "no-store"),
];

/// The span opened for a request by [`logging_middleware`].
///
/// Stored as a request extension so inner middleware can fill in fields
/// that are only known after authentication.
#[derive(Clone, Debug)]
pub struct RequestSpan(Span);

impl RequestSpan {
    pub fn record_user(&self, user_id: i32) {
        self.0.record("user_id", user_id);
    }
}

/// `GET /api/admin/metrics`
pub async fn get_metrics(State(state): State<Arc<AppState>>) -> Result<String, ApiError> {
    state
        .prometheus_handle
        .as_ref()
        .map(metrics_exporter_prometheus::PrometheusHandle::render)
        .ok_or_else(|| ApiError::NotFound("Metrics are disabled".to_string()))
}

pub async fn logging_middleware(mut req: Request, next: Next) -> Response {
    let started = Instant::now();
    let method = req.method().clone();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map_or("unmatched", MatchedPath::as_str)
        .to_string();

    let span = info_span!(
        "request",
        request_id = %Uuid::new_v4(),
        method = %method,
        path = %req.uri().path(),
        user_id = tracing::field::Empty,
    );
    req.extensions_mut().insert(RequestSpan(span.clone()));

    let response = next.run(req).instrument(span.clone()).await;

    let status = response.status();
    let elapsed = started.elapsed();
    record_request(&method, &route, status, elapsed);

    span.in_scope(|| {
        info!(
            status_code = status.as_u16(),
            outcome = outcome(status),
            duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            "Request finished"
        );
    });

    response
}

pub async fn security_headers_middleware(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    for (name, value) in SECURITY_HEADERS {
        headers.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
    }

    response
}

/// Labels by route template, never the raw path, so ids in URLs do not
/// create new series.
fn record_request(method: &Method, route: &str, status: StatusCode, elapsed: Duration) {
    let labels = [
        ("method", method.to_string()),
        ("route", route.to_string()),
        ("status", status.as_u16().to_string()),
    ];

    metrics::counter!("http_requests_total", &labels).increment(1);
    metrics::histogram!("http_request_duration_seconds", &labels).record(elapsed.as_secs_f64());
}

fn outcome(status: StatusCode) -> &'static str {
    if status.is_server_error() {
        "error"
    } else if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
        "denied"
    } else if status.is_client_error() {
        "client_error"
    } else {
        "success"
    }
}
