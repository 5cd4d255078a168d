use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};

use crate::constants;
use crate::entities::users;

/// User data returned from repository (without sensitive password hash)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub is_admin: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl User {
    /// The bootstrap administrator may not be deleted, renamed or demoted.
    #[must_use]
    pub fn is_protected(&self) -> bool {
        self.username == constants::admin::USERNAME
    }
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            is_admin: model.is_admin,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Get user by username
    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        find_by_username(&self.conn, username).await
    }

    /// Get user by username together with the stored password hash
    pub async fn get_credentials(&self, username: &str) -> Result<Option<(User, String)>> {
        let user = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user credentials")?;

        Ok(user.map(|u| {
            let password_hash = u.password_hash.clone();
            (User::from(u), password_hash)
        }))
    }

    /// Get the stored password hash for a user ID
    pub async fn get_password_hash(&self, id: i32) -> Result<Option<String>> {
        let user = users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user password hash")?;

        Ok(user.map(|u| u.password_hash))
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i32) -> Result<Option<User>> {
        let user = users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")?;

        Ok(user.map(User::from))
    }

    /// List all users ordered by ID
    pub async fn list(&self) -> Result<Vec<User>> {
        let users = users::Entity::find()
            .order_by_asc(users::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list users")?;

        Ok(users.into_iter().map(User::from).collect())
    }

    pub async fn create(&self, username: &str, password_hash: &str, is_admin: bool) -> Result<User> {
        insert(&self.conn, username, password_hash, is_admin).await
    }

    /// Update username and role. Returns `None` if the user does not exist.
    pub async fn update(&self, id: i32, username: &str, is_admin: bool) -> Result<Option<User>> {
        let Some(user) = users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user for update")?
        else {
            return Ok(None);
        };

        let mut active: users::ActiveModel = user.into();
        active.username = Set(username.to_string());
        active.is_admin = Set(is_admin);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        let updated = active
            .update(&self.conn)
            .await
            .context("Failed to update user")?;

        Ok(Some(User::from(updated)))
    }

    /// Replace the stored password hash. Returns `false` if the user does not exist.
    pub async fn update_password_hash(&self, id: i32, password_hash: &str) -> Result<bool> {
        let Some(user) = users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user for password update")?
        else {
            return Ok(false);
        };

        let mut active: users::ActiveModel = user.into();
        active.password_hash = Set(password_hash.to_string());
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active
            .update(&self.conn)
            .await
            .context("Failed to update password")?;

        Ok(true)
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = users::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete user")?;

        Ok(result.rows_affected > 0)
    }
}

/// Look up a user on any connection, including an open transaction.
pub async fn find_by_username<C: ConnectionTrait>(db: &C, username: &str) -> Result<Option<User>> {
    let user = users::Entity::find()
        .filter(users::Column::Username.eq(username))
        .one(db)
        .await
        .context("Failed to query user by username")?;

    Ok(user.map(User::from))
}

/// Insert a user. A duplicate username surfaces as a unique constraint
/// violation from the store.
pub async fn insert<C: ConnectionTrait>(
    db: &C,
    username: &str,
    password_hash: &str,
    is_admin: bool,
) -> Result<User> {
    let now = chrono::Utc::now().to_rfc3339();

    let active = users::ActiveModel {
        username: Set(username.to_string()),
        password_hash: Set(password_hash.to_string()),
        is_admin: Set(is_admin),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    };

    let model = active
        .insert(db)
        .await
        .with_context(|| format!("Failed to insert user {username}"))?;

    Ok(User::from(model))
}
