//! Durable system options plus the in-process cache that mirrors them.
//!
//! The cache holds the registration flag and every auto-load option. It has
//! a single writer: [`SettingsStore::update`] takes the write lock before
//! touching the database and releases it only after the cache reflects the
//! committed value, so readers never see the two diverge.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Context;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::info;

use crate::constants::options::{self, DefaultOption};
use crate::db::repositories::option;
use crate::db::{Store, SystemOption};

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Option not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for SettingsError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(format!("{err:#}"))
    }
}

/// Snapshot of the cached settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeSettings {
    allow_registration: bool,
    values: HashMap<String, String>,
}

impl RuntimeSettings {
    #[must_use]
    pub const fn allow_registration(&self) -> bool {
        self.allow_registration
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    fn apply(&mut self, option: &SystemOption) {
        if option.option_name == options::ALLOW_REGISTRATION {
            self.allow_registration = option.option_value == options::TRUE;
        }

        if option.auto_load {
            self.values
                .insert(option.option_name.clone(), option.option_value.clone());
        } else {
            self.values.remove(&option.option_name);
        }
    }
}

#[derive(Clone)]
pub struct SettingsStore {
    store: Store,
    cache: Arc<RwLock<RuntimeSettings>>,
}

impl SettingsStore {
    #[must_use]
    pub fn new(store: Store) -> Self {
        Self {
            store,
            cache: Arc::new(RwLock::new(RuntimeSettings::default())),
        }
    }

    /// Rebuild the cache from the auto-load options in the store.
    pub async fn load(&self) -> Result<(), SettingsError> {
        let mut cache = self.cache.write().await;
        let rows = self.store.list_auto_load_options().await?;

        let mut fresh = RuntimeSettings::default();
        for row in &rows {
            fresh.apply(row);
        }
        *cache = fresh;

        info!(
            options = rows.len(),
            allow_registration = cache.allow_registration,
            "Settings cache loaded"
        );
        Ok(())
    }

    pub async fn get(&self, name: &str) -> Result<SystemOption, SettingsError> {
        self.store
            .get_option(name)
            .await?
            .ok_or_else(|| SettingsError::NotFound(name.to_string()))
    }

    pub async fn list(&self, visible_only: bool) -> Result<Vec<SystemOption>, SettingsError> {
        Ok(self.store.list_options(visible_only).await?)
    }

    /// Overwrite an existing option and refresh the cache in the same call.
    pub async fn update(&self, name: &str, value: &str) -> Result<SystemOption, SettingsError> {
        let mut cache = self.cache.write().await;

        // The write and its re-read commit together or not at all
        let txn = self.store.begin().await?;
        let updated = option::set_value(&txn, name, value)
            .await?
            .ok_or_else(|| SettingsError::NotFound(name.to_string()))?;
        txn.commit()
            .await
            .with_context(|| format!("Failed to commit option {name}"))?;

        cache.apply(&updated);

        info!(option = %updated.option_name, "Option updated");
        Ok(updated)
    }

    /// Insert any missing defaults; existing values are left alone.
    pub async fn seed_defaults(&self, defaults: &[DefaultOption]) -> Result<usize, SettingsError> {
        Ok(self.store.seed_options(defaults).await?)
    }

    pub async fn allow_registration(&self) -> bool {
        self.cache.read().await.allow_registration
    }

    pub async fn snapshot(&self) -> RuntimeSettings {
        self.cache.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::ConnectionTrait;

    async fn seeded() -> SettingsStore {
        let store = Store::new("sqlite::memory:").await.unwrap();
        let settings = SettingsStore::new(store);
        settings.seed_defaults(options::DEFAULTS).await.unwrap();
        settings.load().await.unwrap();
        settings
    }

    #[tokio::test]
    async fn seed_is_idempotent_and_never_overwrites() {
        let settings = seeded().await;
        settings.update(options::SYSTEM_NAME, "Ops Console").await.unwrap();

        let inserted = settings.seed_defaults(options::DEFAULTS).await.unwrap();
        assert_eq!(inserted, 0);

        let all = settings.list(false).await.unwrap();
        assert_eq!(all.len(), options::DEFAULTS.len());
        assert_eq!(
            settings.get(options::SYSTEM_NAME).await.unwrap().option_value,
            "Ops Console"
        );
    }

    #[tokio::test]
    async fn list_visible_filters_hidden_options() {
        let settings = seeded().await;

        let visible = settings.list(true).await.unwrap();
        let names: Vec<&str> = visible.iter().map(|o| o.option_name.as_str()).collect();

        assert!(names.contains(&options::SYSTEM_NAME));
        assert!(names.contains(&options::ALLOW_REGISTRATION));
        assert!(!names.contains(&options::SYSTEM_INITIALIZED));

        let ids: Vec<i32> = visible.iter().map(|o| o.id).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_eq!(ids, sorted);
    }

    #[tokio::test]
    async fn update_refreshes_registration_flag() {
        let settings = seeded().await;
        assert!(!settings.allow_registration().await);

        settings
            .update(options::ALLOW_REGISTRATION, options::TRUE)
            .await
            .unwrap();
        assert!(settings.allow_registration().await);

        settings
            .update(options::ALLOW_REGISTRATION, options::FALSE)
            .await
            .unwrap();
        assert!(!settings.allow_registration().await);
    }

    #[tokio::test]
    async fn update_refreshes_auto_loaded_values() {
        let settings = seeded().await;
        settings.update(options::SYSTEM_NAME, "Ops Console").await.unwrap();

        let snapshot = settings.snapshot().await;
        assert_eq!(snapshot.get(options::SYSTEM_NAME), Some("Ops Console"));
    }

    #[tokio::test]
    async fn update_unknown_option_is_not_found() {
        let settings = seeded().await;

        let err = settings.update("no_such_option", "x").await.unwrap_err();
        assert!(matches!(err, SettingsError::NotFound(name) if name == "no_such_option"));
        assert!(matches!(
            settings.get("no_such_option").await,
            Err(SettingsError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn update_bumps_updated_at() {
        let settings = seeded().await;
        let before = settings.get(options::SYSTEM_NAME).await.unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let after = settings.update(options::SYSTEM_NAME, "Renamed").await.unwrap();

        assert_eq!(after.created_at, before.created_at);
        assert_ne!(after.updated_at, before.updated_at);
    }

    #[tokio::test]
    async fn failed_update_keeps_store_and_cache_in_step() {
        let settings = seeded().await;
        // Renaming the row after the write makes the re-read come back empty
        settings
            .store
            .conn
            .execute_unprepared(
                "CREATE TRIGGER move_registration AFTER UPDATE OF option_value ON options \
                 WHEN NEW.option_name = 'allow_registration' \
                 BEGIN UPDATE options SET option_name = 'moved' WHERE id = NEW.id; END;",
            )
            .await
            .unwrap();

        let err = settings
            .update(options::ALLOW_REGISTRATION, options::TRUE)
            .await
            .unwrap_err();
        assert!(matches!(err, SettingsError::NotFound(_)));

        let stored = settings.get(options::ALLOW_REGISTRATION).await.unwrap();
        assert_eq!(stored.option_value, options::FALSE);
        assert!(!settings.allow_registration().await);
        assert!(matches!(
            settings.get("moved").await,
            Err(SettingsError::NotFound(_))
        ));
    }
}
