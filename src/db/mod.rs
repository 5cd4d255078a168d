use anyhow::Result;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DatabaseTransaction, DbErr,
    RuntimeErr, SqlErr, Statement, TransactionTrait,
};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::constants::options::DefaultOption;

pub mod migrator;
pub mod repositories;

pub use repositories::option::SystemOption;
pub use repositories::user::User;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        let in_memory = db_url.contains(":memory:");

        if !in_memory {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .sqlx_logging(false);

        if in_memory {
            // Every SQLite memory connection is its own database; keep exactly
            // one alive for the lifetime of the pool.
            opt.max_connections(1).min_connections(1);
        } else {
            opt.max_connections(max_connections)
                .min_connections(min_connections)
                .idle_timeout(Duration::from_secs(300))
                .max_lifetime(Duration::from_secs(600));
        }

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    pub async fn begin(&self) -> Result<DatabaseTransaction> {
        Ok(self.conn.begin().await?)
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn option_repo(&self) -> repositories::option::OptionRepository {
        repositories::option::OptionRepository::new(self.conn.clone())
    }

    // Users

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.user_repo().get_by_username(username).await
    }

    pub async fn get_user_by_id(&self, id: i32) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn get_user_credentials(&self, username: &str) -> Result<Option<(User, String)>> {
        self.user_repo().get_credentials(username).await
    }

    pub async fn get_user_password_hash(&self, id: i32) -> Result<Option<String>> {
        self.user_repo().get_password_hash(id).await
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        self.user_repo().list().await
    }

    pub async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        is_admin: bool,
    ) -> Result<User> {
        self.user_repo()
            .create(username, password_hash, is_admin)
            .await
    }

    pub async fn update_user(&self, id: i32, username: &str, is_admin: bool) -> Result<Option<User>> {
        self.user_repo().update(id, username, is_admin).await
    }

    pub async fn update_user_password_hash(&self, id: i32, password_hash: &str) -> Result<bool> {
        self.user_repo()
            .update_password_hash(id, password_hash)
            .await
    }

    pub async fn delete_user(&self, id: i32) -> Result<bool> {
        self.user_repo().delete(id).await
    }

    // Options

    pub async fn get_option(&self, name: &str) -> Result<Option<SystemOption>> {
        self.option_repo().get(name).await
    }

    pub async fn list_options(&self, visible_only: bool) -> Result<Vec<SystemOption>> {
        self.option_repo().list(visible_only).await
    }

    pub async fn list_auto_load_options(&self) -> Result<Vec<SystemOption>> {
        self.option_repo().list_auto_load().await
    }

    pub async fn set_option_value(&self, name: &str, value: &str) -> Result<Option<SystemOption>> {
        self.option_repo().set_value(name, value).await
    }

    pub async fn seed_options(&self, defaults: &[DefaultOption]) -> Result<usize> {
        self.option_repo().seed_defaults(defaults).await
    }
}

/// Whether an error chain bottoms out in a unique constraint violation.
#[must_use]
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.chain()
        .filter_map(|cause| cause.downcast_ref::<DbErr>())
        .any(|db_err| matches!(db_err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))))
}

/// Whether an error chain bottoms out in SQLite reporting a busy or locked database.
///
/// A deferred transaction that tries to upgrade its read lock while another
/// connection holds the write lock fails this way instead of waiting.
#[must_use]
pub fn is_busy(err: &anyhow::Error) -> bool {
    err.chain()
        .filter_map(|cause| cause.downcast_ref::<DbErr>())
        .any(db_err_is_busy)
}

fn db_err_is_busy(err: &DbErr) -> bool {
    let (DbErr::Conn(RuntimeErr::SqlxError(sqlx_err))
    | DbErr::Exec(RuntimeErr::SqlxError(sqlx_err))
    | DbErr::Query(RuntimeErr::SqlxError(sqlx_err))) = err
    else {
        return false;
    };
    let sqlx_err: &sea_orm::sqlx::Error = sqlx_err;

    match sqlx_err {
        // SQLITE_BUSY, SQLITE_LOCKED and their extended codes
        sea_orm::sqlx::Error::Database(db) => matches!(
            db.code().as_deref(),
            Some("5" | "6" | "261" | "262" | "517")
        ),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::user;

    #[tokio::test]
    async fn duplicate_username_is_a_unique_violation() {
        let store = Store::new("sqlite::memory:").await.unwrap();
        store.create_user("alice", "hash", false).await.unwrap();

        let err = store.create_user("alice", "hash", false).await.unwrap_err();
        assert!(is_unique_violation(&err));
    }

    #[tokio::test]
    async fn constraint_errors_are_not_busy() {
        let store = Store::new("sqlite::memory:").await.unwrap();
        store.create_user("alice", "hash", false).await.unwrap();

        let err = store.create_user("alice", "hash", false).await.unwrap_err();
        assert!(!is_busy(&err));
        assert!(!is_busy(&anyhow::anyhow!("database is locked")));
    }

    #[tokio::test]
    async fn write_lock_held_elsewhere_is_busy() {
        let path = std::env::temp_dir().join(format!("opsdesk-busy-{}.db", uuid::Uuid::new_v4()));
        let url = format!("sqlite:{}", path.display());
        let a = Store::new(&url).await.unwrap();
        let b = Store::new(&url).await.unwrap();

        let writer = a.begin().await.unwrap();
        user::insert(&writer, "writer", "hash", false).await.unwrap();

        // Read first so the insert below has to upgrade a held lock
        let reader = b.begin().await.unwrap();
        user::find_by_username(&reader, "anyone").await.unwrap();
        let err = user::insert(&reader, "reader", "hash", false)
            .await
            .unwrap_err();
        assert!(is_busy(&err), "{err:#}");

        reader.rollback().await.unwrap();
        writer.commit().await.unwrap();
        a.conn.close().await.unwrap();
        b.conn.close().await.unwrap();
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn usernames_are_case_sensitive() {
        let store = Store::new("sqlite::memory:").await.unwrap();
        store.create_user("alice", "hash", false).await.unwrap();
        store.create_user("Alice", "hash", false).await.unwrap();

        assert!(store.get_user_by_username("ALICE").await.unwrap().is_none());
        assert_eq!(store.list_users().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn set_value_never_creates_rows() {
        let store = Store::new("sqlite::memory:").await.unwrap();

        let updated = store.set_option_value("no_such_option", "x").await.unwrap();
        assert!(updated.is_none());
        assert!(store.get_option("no_such_option").await.unwrap().is_none());
    }
}
