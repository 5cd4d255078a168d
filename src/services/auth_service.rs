//! Domain service for authentication.
//!
//! Handles login, self-registration and password changes for the signed-in user.

use serde::Serialize;
use thiserror::Error;

use crate::auth::{PasswordError, TokenError};
use crate::db::User;

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Registration is disabled")]
    RegistrationClosed,

    #[error("Username already taken: {0}")]
    UsernameTaken(String),

    #[error("User not found")]
    UserNotFound,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(format!("{err:#}"))
    }
}

impl From<PasswordError> for AuthError {
    fn from(err: PasswordError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Public projection of a user; never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserInfo {
    pub id: i32,
    pub username: String,
    pub is_admin: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            is_admin: user.is_admin,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Login result containing the bearer token and the user it was issued for.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResult {
    pub token: String,
    pub user: UserInfo,
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Verifies credentials and issues a token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] for an unknown user or a
    /// wrong password, without saying which.
    async fn login(&self, username: &str, password: &str) -> Result<LoginResult, AuthError>;

    /// Creates a non-admin account when self-registration is open.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::RegistrationClosed`] when the cached
    /// `allow_registration` flag is off and [`AuthError::UsernameTaken`] on a
    /// duplicate username.
    async fn register(&self, username: &str, password: &str) -> Result<UserInfo, AuthError>;

    /// Gets information for a specific user.
    async fn get_user_info(&self, user_id: i32) -> Result<UserInfo, AuthError>;

    /// Changes a user's password.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Validation`] if the current password is incorrect or the new one is invalid.
    async fn change_password(
        &self,
        user_id: i32,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError>;
}
