//! Administrator user management endpoints.

use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;

use super::validation::validate_user_id;
use super::{ApiError, ApiResponse, AppState, CreateUserRequest, MessageResponse, UpdateUserRequest};
use crate::services::{PasswordReset, UserInfo};

/// GET /admin/users
pub async fn list_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<UserInfo>>>, ApiError> {
    let users = state.user_service().list().await?;
    Ok(Json(ApiResponse::success(users)))
}

/// POST /admin/users
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<Json<ApiResponse<UserInfo>>, ApiError> {
    let user = state
        .user_service()
        .create(&payload.username, &payload.password, payload.is_admin)
        .await?;

    Ok(Json(ApiResponse::success(user)))
}

/// PUT /admin/users/{id}
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<ApiResponse<UserInfo>>, ApiError> {
    let id = validate_user_id(id)?;

    let user = state
        .user_service()
        .update(id, payload.username.as_deref(), payload.is_admin)
        .await?;

    Ok(Json(ApiResponse::success(user)))
}

/// DELETE /admin/users/{id}
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let id = validate_user_id(id)?;
    state.user_service().delete(id).await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(format!(
        "User {id} deleted"
    )))))
}

/// POST /admin/users/{id}/reset-password
/// The generated password is only ever returned in this response
pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<PasswordReset>>, ApiError> {
    let id = validate_user_id(id)?;
    let reset = state.user_service().reset_password(id).await?;

    Ok(Json(ApiResponse::success(reset)))
}
