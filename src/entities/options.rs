use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "options")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub option_name: String,

    /// Raw value; callers interpret it (`"true"`/`"false"` for flags)
    pub option_value: String,

    /// Loaded into the in-process settings cache at startup
    pub auto_load: bool,

    /// May be disclosed to non-administrative clients
    pub return_to_frontend: bool,

    pub description: String,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
