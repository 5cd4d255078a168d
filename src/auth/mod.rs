//! Credential hashing, bearer tokens and the resolved request identity.

pub mod password;
pub mod token;

pub use password::{CredentialHasher, PasswordError};
pub use token::{Claims, TokenError, TokenService};

use serde::Serialize;

use crate::constants::limits;

/// Privilege level. Ordered so that a higher role satisfies any lower requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Member,
    Administrator,
}

impl Role {
    #[must_use]
    pub const fn from_admin_flag(is_admin: bool) -> Self {
        if is_admin {
            Self::Administrator
        } else {
            Self::Member
        }
    }

    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Administrator)
    }

    #[must_use]
    pub fn satisfies(self, required: Self) -> bool {
        self >= required
    }
}

/// Identity attached to a request by the auth middleware.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrentUser {
    pub id: i32,
    pub username: String,
    pub role: Role,
}

impl From<Claims> for CurrentUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.id,
            username: claims.username,
            role: Role::from_admin_flag(claims.is_admin),
        }
    }
}

pub fn validate_username(username: &str) -> Result<&str, String> {
    let username = username.trim();
    if username.is_empty() {
        return Err("Username is required".to_string());
    }
    if username.chars().count() > limits::MAX_USERNAME_LEN {
        return Err(format!(
            "Username must be at most {} characters",
            limits::MAX_USERNAME_LEN
        ));
    }
    Ok(username)
}

pub fn validate_password(password: &str) -> Result<(), String> {
    if password.chars().count() < limits::MIN_PASSWORD_LEN {
        return Err(format!(
            "Password must be at least {} characters",
            limits::MIN_PASSWORD_LEN
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn administrator_satisfies_member_but_not_vice_versa() {
        assert!(Role::Administrator.satisfies(Role::Member));
        assert!(Role::Administrator.satisfies(Role::Administrator));
        assert!(Role::Member.satisfies(Role::Member));
        assert!(!Role::Member.satisfies(Role::Administrator));
    }

    #[test]
    fn current_user_from_claims() {
        let user = CurrentUser::from(Claims {
            id: 4,
            username: "dave".to_string(),
            is_admin: false,
            exp: 0,
        });
        assert_eq!(user.role, Role::Member);
        assert_eq!(user.username, "dave");
    }

    #[test]
    fn username_validation() {
        assert_eq!(validate_username("  erin "), Ok("erin"));
        assert!(validate_username("   ").is_err());
        assert!(validate_username(&"x".repeat(65)).is_err());
    }

    #[test]
    fn password_validation() {
        assert!(validate_password("12345").is_err());
        assert!(validate_password("123456").is_ok());
    }
}
