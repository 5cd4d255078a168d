//! Public system endpoints: client bootstrap info and health probes.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, PublicOptionDto, SysInfoResponse};

#[derive(Debug, Serialize)]
pub struct HealthLiveResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthReadyResponse {
    pub ready: bool,
    pub database: bool,
}

/// `GET /api/sysinfo`
///
/// Options flagged for clients plus the registration flag from the settings cache.
/// Hidden options such as `system_initialized` never appear here.
pub async fn get_sysinfo(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<SysInfoResponse>>, ApiError> {
    let options = state.settings().list(true).await?;

    Ok(Json(ApiResponse::success(SysInfoResponse {
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        allow_registration: state.settings().allow_registration().await,
        options: options.into_iter().map(PublicOptionDto::from).collect(),
    })))
}

/// `GET /api/health/live`
pub async fn health_live() -> impl IntoResponse {
    Json(ApiResponse::success(HealthLiveResponse { status: "alive" }))
}

/// `GET /api/health/ready`
///
/// Readiness probe that checks database connectivity.
pub async fn health_ready(State(state): State<Arc<AppState>>) -> Response {
    let database = state.store().ping().await.is_ok();

    let status = if database {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(ApiResponse::success(HealthReadyResponse {
            ready: database,
            database,
        })),
    )
        .into_response()
}
