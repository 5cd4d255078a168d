//! Domain service for administrator-driven user management.

use serde::Serialize;
use thiserror::Error;

use crate::auth::PasswordError;
use crate::services::auth_service::UserInfo;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("User not found: {0}")]
    NotFound(i32),

    #[error("Username already taken: {0}")]
    Conflict(String),

    #[error("The built-in administrator cannot be {0}")]
    Protected(&'static str),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for UserError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(format!("{err:#}"))
    }
}

impl From<PasswordError> for UserError {
    fn from(err: PasswordError) -> Self {
        Self::Internal(err.to_string())
    }
}

/// A freshly generated password, returned exactly once.
#[derive(Debug, Clone, Serialize)]
pub struct PasswordReset {
    pub user: UserInfo,
    pub password: String,
}

#[async_trait::async_trait]
pub trait UserService: Send + Sync {
    /// All users ordered by id.
    async fn list(&self) -> Result<Vec<UserInfo>, UserError>;

    async fn create(
        &self,
        username: &str,
        password: &str,
        is_admin: bool,
    ) -> Result<UserInfo, UserError>;

    /// Rename and/or change the role of a user.
    ///
    /// # Errors
    ///
    /// Returns [`UserError::Protected`] when the change would rename or demote
    /// the built-in administrator.
    async fn update(
        &self,
        id: i32,
        username: Option<&str>,
        is_admin: Option<bool>,
    ) -> Result<UserInfo, UserError>;

    async fn delete(&self, id: i32) -> Result<(), UserError>;

    async fn reset_password(&self, id: i32) -> Result<PasswordReset, UserError>;
}
