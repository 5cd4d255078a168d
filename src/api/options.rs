use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;

use super::validation::validate_option_name;
use super::{ApiError, ApiResponse, AppState, OptionDto, UpdateOptionRequest};

/// GET /admin/options
pub async fn list_options(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<OptionDto>>>, ApiError> {
    let options = state.settings().list(false).await?;
    Ok(Json(ApiResponse::success(
        options.into_iter().map(OptionDto::from).collect(),
    )))
}

/// GET /admin/options/{name}
pub async fn get_option(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<ApiResponse<OptionDto>>, ApiError> {
    let name = validate_option_name(&name)?;
    let option = state.settings().get(name).await?;
    Ok(Json(ApiResponse::success(option.into())))
}

/// PUT /admin/options/{name}
/// Updates an existing option; unknown names are 404, never created
pub async fn update_option(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(payload): Json<UpdateOptionRequest>,
) -> Result<Json<ApiResponse<OptionDto>>, ApiError> {
    let name = validate_option_name(&name)?;
    let option = state.settings().update(name, &payload.value).await?;
    Ok(Json(ApiResponse::success(option.into())))
}
