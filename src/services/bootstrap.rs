//! First-run initialization: default administrator, default options and
//! the `system_initialized` flag, committed together or not at all.

use anyhow::Context;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::auth::{CredentialHasher, PasswordError};
use crate::constants::{admin, options};
use crate::db::repositories::{option, user};
use crate::db::{self, Store};

const MAX_ATTEMPTS: u32 = 5;
const RETRY_BACKOFF: Duration = Duration::from_millis(50);

/// Losing a race shows up as a unique violation or as SQLite refusing the
/// lock upgrade, depending on which statement collides.
fn is_contended(err: &anyhow::Error) -> bool {
    db::is_unique_violation(err) || db::is_busy(err)
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("Failed to hash default admin password: {0}")]
    Hash(#[from] PasswordError),

    #[error("Database error during bootstrap: {0}")]
    Database(String),
}

impl From<anyhow::Error> for BootstrapError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(format!("{err:#}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemState {
    Uninitialized,
    Initialized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    Initialized {
        admin_created: bool,
        options_seeded: usize,
    },
    AlreadyInitialized,
}

pub struct BootstrapInitializer<'a> {
    store: &'a Store,
    hasher: &'a CredentialHasher,
}

impl<'a> BootstrapInitializer<'a> {
    #[must_use]
    pub const fn new(store: &'a Store, hasher: &'a CredentialHasher) -> Self {
        Self { store, hasher }
    }

    pub async fn state(&self) -> Result<SystemState, BootstrapError> {
        let flag = self.store.get_option(options::SYSTEM_INITIALIZED).await?;

        Ok(match flag {
            Some(row) if row.option_value == options::TRUE => SystemState::Initialized,
            _ => SystemState::Uninitialized,
        })
    }

    /// Run the first-run unit of work if it has not completed yet.
    pub async fn run(&self) -> Result<BootstrapOutcome, BootstrapError> {
        if self.state().await? == SystemState::Initialized {
            debug!("System already initialized, skipping bootstrap");
            return Ok(BootstrapOutcome::AlreadyInitialized);
        }

        // Hash before opening the transaction so no connection is held during CPU work
        let password_hash = self
            .hasher
            .hash_async(admin::DEFAULT_PASSWORD.to_string())
            .await?;

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.initialize(&password_hash).await {
                Ok(outcome) => {
                    if let BootstrapOutcome::Initialized {
                        admin_created,
                        options_seeded,
                    } = outcome
                    {
                        info!(admin_created, options_seeded, "System initialized");
                        if admin_created {
                            warn!(
                                "Created default administrator '{}'; change its password",
                                admin::USERNAME
                            );
                        }
                    }
                    return Ok(outcome);
                }
                Err(e) if is_contended(&e) && attempt < MAX_ATTEMPTS => {
                    // Another instance is running the same unit of work
                    warn!(attempt, "Bootstrap contended with another instance: {e:#}");
                    tokio::time::sleep(RETRY_BACKOFF * attempt).await;
                    if self.state().await? == SystemState::Initialized {
                        return Ok(BootstrapOutcome::AlreadyInitialized);
                    }
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    async fn initialize(&self, password_hash: &str) -> anyhow::Result<BootstrapOutcome> {
        let txn = self
            .store
            .begin()
            .await
            .context("Failed to begin bootstrap transaction")?;

        let admin_created = if user::find_by_username(&txn, admin::USERNAME)
            .await?
            .is_none()
        {
            user::insert(&txn, admin::USERNAME, password_hash, true).await?;
            true
        } else {
            false
        };

        let options_seeded = option::seed_defaults(&txn, options::DEFAULTS).await?;

        option::set_value(&txn, options::SYSTEM_INITIALIZED, options::TRUE)
            .await?
            .with_context(|| format!("Option {} missing after seeding", options::SYSTEM_INITIALIZED))?;

        txn.commit()
            .await
            .context("Failed to commit bootstrap transaction")?;

        Ok(BootstrapOutcome::Initialized {
            admin_created,
            options_seeded,
        })
    }
}
