use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub email: String,
    pub username: String,
    /// Argon2 PHC string, never the plaintext.
    pub password: String,
    pub status: String,
    /// Sorted, deduplicated CSV of role ids. Empty string means no roles.
    pub roles: String,
    pub resource_id: Option<i32>,
    pub autobiography_id: Option<i32>,
    pub created_on: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
