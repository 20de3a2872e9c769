use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::errors::UserError;
use crate::types::db::password_reset::{self, Entity as PasswordReset};

/// Queries over the one-time password reset codes.
pub struct ResetStore;

impl ResetStore {
    pub fn new() -> Self {
        Self
    }

    /// Issue a fresh reset code for the account and return it.
    ///
    /// Any code previously issued for the account is deleted first, so at
    /// most one live code exists per user. Generation loops until the
    /// 6-character code is unused.
    pub async fn issue_code(
        &self,
        conn: &impl ConnectionTrait,
        user_id: i32,
    ) -> Result<String, UserError> {
        self.delete_codes_for_user(conn, user_id).await?;

        loop {
            let code: String = Uuid::new_v4().simple().to_string()[..6].to_string();

            let existing = PasswordReset::find()
                .filter(password_reset::Column::ResetCode.eq(code.clone()))
                .one(conn)
                .await
                .map_err(|e| UserError::internal_error(format!("Database error: {}", e)))?;

            if existing.is_some() {
                continue;
            }

            let row = password_reset::ActiveModel {
                id: sea_orm::ActiveValue::NotSet,
                user_id: Set(user_id),
                reset_code: Set(code.clone()),
                created_on: Set(Utc::now().timestamp()),
            };

            row.insert(conn)
                .await
                .map_err(|e| UserError::internal_error(format!("Database error: {}", e)))?;

            return Ok(code);
        }
    }

    /// Look up the account a reset code belongs to.
    pub async fn find_user_by_code(
        &self,
        conn: &impl ConnectionTrait,
        code: &str,
    ) -> Result<Option<i32>, UserError> {
        let row = PasswordReset::find()
            .filter(password_reset::Column::ResetCode.eq(code))
            .one(conn)
            .await
            .map_err(|e| UserError::internal_error(format!("Database error: {}", e)))?;

        Ok(row.map(|r| r.user_id))
    }

    /// Delete every code issued for an account. Called both when a code is
    /// consumed and before issuing a replacement.
    pub async fn delete_codes_for_user(
        &self,
        conn: &impl ConnectionTrait,
        user_id: i32,
    ) -> Result<(), UserError> {
        PasswordReset::delete_many()
            .filter(password_reset::Column::UserId.eq(user_id))
            .exec(conn)
            .await
            .map_err(|e| UserError::internal_error(format!("Database error: {}", e)))?;

        Ok(())
    }
}

impl Default for ResetStore {
    fn default() -> Self {
        Self::new()
    }
}
