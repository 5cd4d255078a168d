//! `SeaORM` implementation of the `UserService` trait.

use async_trait::async_trait;
use rand::distr::{Alphanumeric, SampleString};
use tracing::info;

use crate::auth::{self, CredentialHasher};
use crate::constants::limits;
use crate::db::{self, Store, User};
use crate::services::auth_service::UserInfo;
use crate::services::user_service::{PasswordReset, UserError, UserService};

pub struct SeaOrmUserService {
    store: Store,
    hasher: CredentialHasher,
}

impl SeaOrmUserService {
    #[must_use]
    pub const fn new(store: Store, hasher: CredentialHasher) -> Self {
        Self { store, hasher }
    }

    async fn require(&self, id: i32) -> Result<User, UserError> {
        self.store
            .get_user_by_id(id)
            .await?
            .ok_or(UserError::NotFound(id))
    }
}

fn generate_password() -> String {
    Alphanumeric.sample_string(&mut rand::rng(), limits::RESET_PASSWORD_LEN)
}

#[async_trait]
impl UserService for SeaOrmUserService {
    async fn list(&self) -> Result<Vec<UserInfo>, UserError> {
        let users = self.store.list_users().await?;
        Ok(users.into_iter().map(UserInfo::from).collect())
    }

    async fn create(
        &self,
        username: &str,
        password: &str,
        is_admin: bool,
    ) -> Result<UserInfo, UserError> {
        let username = auth::validate_username(username).map_err(UserError::Validation)?;
        auth::validate_password(password).map_err(UserError::Validation)?;

        let hash = self.hasher.hash_async(password.to_string()).await?;

        match self.store.create_user(username, &hash, is_admin).await {
            Ok(user) => {
                info!(user_id = user.id, is_admin, "User created");
                Ok(user.into())
            }
            Err(e) if db::is_unique_violation(&e) => Err(UserError::Conflict(username.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    async fn update(
        &self,
        id: i32,
        username: Option<&str>,
        is_admin: Option<bool>,
    ) -> Result<UserInfo, UserError> {
        let current = self.require(id).await?;

        let username = match username {
            Some(name) => auth::validate_username(name).map_err(UserError::Validation)?,
            None => current.username.as_str(),
        };
        let is_admin = is_admin.unwrap_or(current.is_admin);

        if current.is_protected() {
            if username != current.username {
                return Err(UserError::Protected("renamed"));
            }
            if !is_admin {
                return Err(UserError::Protected("demoted"));
            }
        }

        match self.store.update_user(id, username, is_admin).await {
            Ok(Some(user)) => {
                info!(user_id = id, is_admin, "User updated");
                Ok(user.into())
            }
            Ok(None) => Err(UserError::NotFound(id)),
            Err(e) if db::is_unique_violation(&e) => Err(UserError::Conflict(username.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, id: i32) -> Result<(), UserError> {
        let user = self.require(id).await?;
        if user.is_protected() {
            return Err(UserError::Protected("deleted"));
        }

        if !self.store.delete_user(id).await? {
            return Err(UserError::NotFound(id));
        }

        info!(user_id = id, "User deleted");
        Ok(())
    }

    async fn reset_password(&self, id: i32) -> Result<PasswordReset, UserError> {
        let user = self.require(id).await?;

        let password = generate_password();
        let hash = self.hasher.hash_async(password.clone()).await?;

        if !self.store.update_user_password_hash(id, &hash).await? {
            return Err(UserError::NotFound(id));
        }

        info!(user_id = id, "Password reset by administrator");
        Ok(PasswordReset {
            user: user.into(),
            password,
        })
    }
}
