//! `SeaORM` implementation of the `AuthService` trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::auth::{self, CredentialHasher, TokenService};
use crate::db::{self, Store};
use crate::services::auth_service::{AuthError, AuthService, LoginResult, UserInfo};
use crate::services::settings::SettingsStore;

pub struct SeaOrmAuthService {
    store: Store,
    hasher: CredentialHasher,
    tokens: TokenService,
    settings: SettingsStore,
    /// Verified against when the username does not exist.
    decoy_hash: OnceCell<String>,
}

impl SeaOrmAuthService {
    #[must_use]
    pub fn new(
        store: Store,
        hasher: CredentialHasher,
        tokens: TokenService,
        settings: SettingsStore,
    ) -> Self {
        Self {
            store,
            hasher,
            tokens,
            settings,
            decoy_hash: OnceCell::new(),
        }
    }

    async fn decoy_hash(&self) -> Result<&str, AuthError> {
        let hash = self
            .decoy_hash
            .get_or_try_init(|| self.hasher.hash_async(uuid::Uuid::new_v4().to_string()))
            .await?;
        Ok(hash)
    }
}

fn record_login(outcome: &'static str) {
    metrics::counter!("auth_login_total", "outcome" => outcome).increment(1);
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn login(&self, username: &str, password: &str) -> Result<LoginResult, AuthError> {
        let Some((user, hash)) = self.store.get_user_credentials(username).await? else {
            // Unknown usernames cost one Argon2 verification like known ones
            let decoy = self.decoy_hash().await?.to_string();
            self.hasher.verify_async(decoy, password.to_string()).await;
            record_login("failure");
            return Err(AuthError::InvalidCredentials);
        };

        if !self.hasher.verify_async(hash, password.to_string()).await {
            record_login("failure");
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.tokens.issue(user.id, &user.username, user.is_admin)?;
        record_login("success");
        info!(user_id = user.id, "User logged in");

        Ok(LoginResult {
            token,
            user: user.into(),
        })
    }

    async fn register(&self, username: &str, password: &str) -> Result<UserInfo, AuthError> {
        if !self.settings.allow_registration().await {
            return Err(AuthError::RegistrationClosed);
        }

        let username = auth::validate_username(username).map_err(AuthError::Validation)?;
        auth::validate_password(password).map_err(AuthError::Validation)?;

        let hash = self.hasher.hash_async(password.to_string()).await?;

        match self.store.create_user(username, &hash, false).await {
            Ok(user) => {
                info!(user_id = user.id, "User registered");
                Ok(user.into())
            }
            Err(e) if db::is_unique_violation(&e) => {
                Err(AuthError::UsernameTaken(username.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get_user_info(&self, user_id: i32) -> Result<UserInfo, AuthError> {
        let user = self
            .store
            .get_user_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        Ok(user.into())
    }

    async fn change_password(
        &self,
        user_id: i32,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        auth::validate_password(new_password).map_err(AuthError::Validation)?;

        if current_password == new_password {
            return Err(AuthError::Validation(
                "New password must be different from current password".to_string(),
            ));
        }

        let hash = self
            .store
            .get_user_password_hash(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if !self
            .hasher
            .verify_async(hash, current_password.to_string())
            .await
        {
            warn!(user_id, "Password change rejected: current password mismatch");
            return Err(AuthError::Validation(
                "Current password is incorrect".to_string(),
            ));
        }

        let new_hash = self.hasher.hash_async(new_password.to_string()).await?;

        if !self
            .store
            .update_user_password_hash(user_id, &new_hash)
            .await?
        {
            return Err(AuthError::UserNotFound);
        }

        info!(user_id, "Password changed");
        Ok(())
    }
}
