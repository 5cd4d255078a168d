use serde::{Deserialize, Serialize};

use crate::db::SystemOption;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub is_admin: bool,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub is_admin: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateOptionRequest {
    pub value: String,
}

/// Option as shown to administrators.
#[derive(Debug, Serialize)]
pub struct OptionDto {
    pub name: String,
    pub value: String,
    pub auto_load: bool,
    pub return_to_frontend: bool,
    pub description: String,
    pub updated_at: String,
}

impl From<SystemOption> for OptionDto {
    fn from(option: SystemOption) -> Self {
        Self {
            name: option.option_name,
            value: option.option_value,
            auto_load: option.auto_load,
            return_to_frontend: option.return_to_frontend,
            description: option.description,
            updated_at: option.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PublicOptionDto {
    pub name: String,
    pub value: String,
}

impl From<SystemOption> for PublicOptionDto {
    fn from(option: SystemOption) -> Self {
        Self {
            name: option.option_name,
            value: option.option_value,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SysInfoResponse {
    pub version: &'static str,
    pub uptime_seconds: u64,
    pub allow_registration: bool,
    pub options: Vec<PublicOptionDto>,
}
