use anyhow::{Context, Result};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::Serialize;

use crate::constants::options::DefaultOption;
use crate::entities::options;

/// A named system option as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SystemOption {
    pub id: i32,
    pub option_name: String,
    pub option_value: String,
    pub auto_load: bool,
    pub return_to_frontend: bool,
    pub description: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<options::Model> for SystemOption {
    fn from(model: options::Model) -> Self {
        Self {
            id: model.id,
            option_name: model.option_name,
            option_value: model.option_value,
            auto_load: model.auto_load,
            return_to_frontend: model.return_to_frontend,
            description: model.description,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

pub struct OptionRepository {
    conn: DatabaseConnection,
}

impl OptionRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get(&self, name: &str) -> Result<Option<SystemOption>> {
        find_by_name(&self.conn, name).await
    }

    /// List options by ascending ID, optionally only those visible to clients.
    pub async fn list(&self, visible_only: bool) -> Result<Vec<SystemOption>> {
        let mut query = options::Entity::find();
        if visible_only {
            query = query.filter(options::Column::ReturnToFrontend.eq(true));
        }

        let rows = query
            .order_by_asc(options::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list options")?;

        Ok(rows.into_iter().map(SystemOption::from).collect())
    }

    pub async fn list_auto_load(&self) -> Result<Vec<SystemOption>> {
        let rows = options::Entity::find()
            .filter(options::Column::AutoLoad.eq(true))
            .order_by_asc(options::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list auto-load options")?;

        Ok(rows.into_iter().map(SystemOption::from).collect())
    }

    pub async fn set_value(&self, name: &str, value: &str) -> Result<Option<SystemOption>> {
        set_value(&self.conn, name, value).await
    }

    pub async fn seed_defaults(&self, defaults: &[DefaultOption]) -> Result<usize> {
        seed_defaults(&self.conn, defaults).await
    }
}

pub async fn find_by_name<C: ConnectionTrait>(db: &C, name: &str) -> Result<Option<SystemOption>> {
    let row = options::Entity::find()
        .filter(options::Column::OptionName.eq(name))
        .one(db)
        .await
        .with_context(|| format!("Failed to query option {name}"))?;

    Ok(row.map(SystemOption::from))
}

/// Overwrite an existing option's value in a single statement.
///
/// Returns `None` when no option has that name; no row is created.
pub async fn set_value<C: ConnectionTrait>(
    db: &C,
    name: &str,
    value: &str,
) -> Result<Option<SystemOption>> {
    let now = chrono::Utc::now().to_rfc3339();

    let result = options::Entity::update_many()
        .col_expr(options::Column::OptionValue, Expr::value(value))
        .col_expr(options::Column::UpdatedAt, Expr::value(now))
        .filter(options::Column::OptionName.eq(name))
        .exec(db)
        .await
        .with_context(|| format!("Failed to update option {name}"))?;

    if result.rows_affected == 0 {
        return Ok(None);
    }

    find_by_name(db, name).await
}

/// Insert each default that has no row yet. Existing values are never
/// touched. Returns the number of rows inserted.
pub async fn seed_defaults<C: ConnectionTrait>(db: &C, defaults: &[DefaultOption]) -> Result<usize> {
    let mut inserted = 0;

    for default in defaults {
        if find_by_name(db, default.name).await?.is_some() {
            continue;
        }

        let now = chrono::Utc::now().to_rfc3339();
        let active = options::ActiveModel {
            option_name: Set(default.name.to_string()),
            option_value: Set(default.value.to_string()),
            auto_load: Set(default.auto_load),
            return_to_frontend: Set(default.return_to_frontend),
            description: Set(default.description.to_string()),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        active
            .insert(db)
            .await
            .with_context(|| format!("Failed to seed option {}", default.name))?;
        inserted += 1;
    }

    Ok(inserted)
}
