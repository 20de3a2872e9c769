use sea_orm::entity::prelude::*;

/// Append-only audit snapshot of an account. Exactly one row exists per
/// (user_id, version); rows are never updated after insertion.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "user_history")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub version: i32,
    pub changed_by: i32,
    pub changed_on: i64,
    pub action: String,
    pub username: String,
    pub email: String,
    pub roles: String,
    pub status: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
