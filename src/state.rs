use std::sync::Arc;
use tokio::sync::RwLock;

use crate::auth::{CredentialHasher, TokenService};
use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AuthService, BootstrapInitializer, SeaOrmAuthService, SeaOrmUserService, SettingsStore,
    UserService,
};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub hasher: CredentialHasher,

    pub tokens: TokenService,

    pub settings: SettingsStore,

    pub auth_service: Arc<dyn AuthService>,

    pub user_service: Arc<dyn UserService>,
}

impl SharedState {
    /// Connects the store, runs first-run bootstrap and warms the settings cache.
    ///
    /// A bootstrap failure is returned as an error; the caller must not serve
    /// requests against a half-initialized store.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let hasher = CredentialHasher::new(&config.security)?;
        let tokens = TokenService::from_config(&config.security);

        BootstrapInitializer::new(&store, &hasher)
            .run()
            .await
            .map_err(|e| anyhow::anyhow!("Bootstrap failed: {e}"))?;

        let settings = SettingsStore::new(store.clone());
        settings
            .load()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to load settings: {e}"))?;

        let auth_service = Arc::new(SeaOrmAuthService::new(
            store.clone(),
            hasher.clone(),
            tokens.clone(),
            settings.clone(),
        )) as Arc<dyn AuthService>;

        let user_service =
            Arc::new(SeaOrmUserService::new(store.clone(), hasher.clone())) as Arc<dyn UserService>;

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            store,
            hasher,
            tokens,
            settings,
            auth_service,
            user_service,
        })
    }

    pub async fn config(&self) -> Config {
        self.config.read().await.clone()
    }
}
