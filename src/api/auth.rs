use axum::{
    Extension, Json,
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use super::observability::RequestSpan;
use super::{ApiError, ApiResponse, AppState, ChangePasswordRequest, CredentialsRequest, MessageResponse};
use crate::auth::{CurrentUser, Role};
use crate::services::{LoginResult, UserInfo};

// ============================================================================
// Middleware
// ============================================================================

/// Resolves `Authorization: Bearer <token>` into a [`CurrentUser`] request extension.
///
/// Missing, malformed, forged and expired tokens all get the same 401.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = extract_bearer_token(request.headers()) else {
        return ApiError::unauthorized().into_response();
    };

    let claims = match state.tokens().verify(token) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::debug!("Rejected bearer token: {e}");
            return ApiError::unauthorized().into_response();
        }
    };

    let user = CurrentUser::from(claims);
    if let Some(span) = request.extensions().get::<RequestSpan>() {
        span.record_user(user.id);
    }
    request.extensions_mut().insert(user);

    next.run(request).await
}

/// Rejects identities whose role is below the required one. Must run after
/// [`auth_middleware`].
pub async fn require_role(State(required): State<Role>, request: Request, next: Next) -> Response {
    let Some(user) = request.extensions().get::<CurrentUser>() else {
        return ApiError::unauthorized().into_response();
    };

    if !user.role.satisfies(required) {
        tracing::warn!(user_id = user.id, required = ?required, "Role check failed");
        return ApiError::forbidden("Insufficient privileges").into_response();
    }

    next.run(request).await
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /login
/// Authenticate with username and password, returns a bearer token on success
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CredentialsRequest>,
) -> Result<Json<ApiResponse<LoginResult>>, ApiError> {
    if payload.username.is_empty() {
        return Err(ApiError::validation("Username is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let result = state
        .auth_service()
        .login(&payload.username, &payload.password)
        .await?;

    Ok(Json(ApiResponse::success(result)))
}

/// POST /register
/// Self-registration; only available while `allow_registration` is on
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CredentialsRequest>,
) -> Result<Json<ApiResponse<UserInfo>>, ApiError> {
    let user = state
        .auth_service()
        .register(&payload.username, &payload.password)
        .await?;

    Ok(Json(ApiResponse::success(user)))
}

/// POST /logout
/// Tokens are stateless; the client discards its copy
pub async fn logout(Extension(user): Extension<CurrentUser>) -> Json<ApiResponse<MessageResponse>> {
    tracing::info!(user_id = user.id, "User logged out");
    Json(ApiResponse::success(MessageResponse::new("Logged out")))
}

/// GET /user
pub async fn get_current_user(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<UserInfo>>, ApiError> {
    let info = state.auth_service().get_user_info(user.id).await?;
    Ok(Json(ApiResponse::success(info)))
}

/// PUT /user/password
/// Change password (requires current password verification)
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state
        .auth_service()
        .change_password(user.id, &payload.current_password, &payload.new_password)
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Password updated successfully",
    ))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn bearer_token_extraction() {
        assert_eq!(extract_bearer_token(&headers("Bearer abc.def.ghi")), Some("abc.def.ghi"));
        assert_eq!(extract_bearer_token(&headers("Bearer   ")), None);
        assert_eq!(extract_bearer_token(&headers("Basic dXNlcjpwYXNz")), None);
        assert_eq!(extract_bearer_token(&headers("bearer abc")), None);
        assert_eq!(extract_bearer_token(&HeaderMap::new()), None);
    }
}
