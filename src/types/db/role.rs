use sea_orm::entity::prelude::*;

/// A persisted role definition. The administrator marker (id 0) is never
/// stored in this table; it is recognized directly wherever role CSVs are
/// parsed.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "role")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    /// CSV of privilege ids granted by this role.
    pub privileges: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
