use sea_orm::{ConnectionTrait, EntityTrait, QueryOrder};

use crate::errors::UserError;
use crate::types::db::role::{self, Entity as RoleEntity};

/// Queries over the persisted role catalog.
///
/// The administrator marker never appears here; callers handle it before
/// consulting the catalog.
pub struct RoleStore;

impl RoleStore {
    pub fn new() -> Self {
        Self
    }

    /// The full role catalog, ordered by id.
    pub async fn catalog(
        &self,
        conn: &impl ConnectionTrait,
    ) -> Result<Vec<role::Model>, UserError> {
        RoleEntity::find()
            .order_by_asc(role::Column::Id)
            .all(conn)
            .await
            .map_err(|e| UserError::internal_error(format!("Database error: {}", e)))
    }

    /// Just the persisted role ids, ascending. Used by the merge scan in
    /// role-id validation.
    pub async fn sorted_ids(&self, conn: &impl ConnectionTrait) -> Result<Vec<i32>, UserError> {
        let catalog = self.catalog(conn).await?;
        Ok(catalog.into_iter().map(|r| r.id).collect())
    }
}

impl Default for RoleStore {
    fn default() -> Self {
        Self::new()
    }
}
