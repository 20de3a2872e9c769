use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};

use crate::errors::UserError;
use crate::types::db::user::{self, Entity as User};
use crate::types::db::user_history::{self, Entity as UserHistory};
use crate::types::internal::account::{UserAction, UserStatus};
use crate::types::internal::roles::ADMIN_ROLE_ID;

/// Field values for a new account row
pub struct NewUser {
    pub email: String,
    pub username: String,
    /// Argon2 PHC string
    pub password_hash: String,
    pub status: UserStatus,
    /// Canonical roles CSV (sorted, deduplicated)
    pub roles: String,
}

/// Optional per-field changes applied by an edit
#[derive(Default)]
pub struct AccountChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub roles: Option<String>,
    pub status: Option<UserStatus>,
    /// Argon2 PHC string of the replacement password
    pub password_hash: Option<String>,
}

/// Snapshot written into the history table
pub struct HistorySnapshot {
    pub user_id: i32,
    pub version: i32,
    pub changed_by: i32,
    pub action: UserAction,
    pub username: String,
    pub email: String,
    pub roles: String,
    pub status: String,
}

/// Queries over the `user` and `user_history` tables.
///
/// Methods take the connection explicitly so callers can run several of
/// them inside one transaction.
pub struct UserStore;

impl UserStore {
    pub fn new() -> Self {
        Self
    }

    pub async fn find_by_id(
        &self,
        conn: &impl ConnectionTrait,
        id: i32,
    ) -> Result<Option<user::Model>, UserError> {
        User::find_by_id(id)
            .one(conn)
            .await
            .map_err(|e| UserError::internal_error(format!("Database error: {}", e)))
    }

    pub async fn find_active_by_email(
        &self,
        conn: &impl ConnectionTrait,
        email: &str,
    ) -> Result<Option<user::Model>, UserError> {
        User::find()
            .filter(user::Column::Email.eq(email))
            .filter(user::Column::Status.eq(UserStatus::Active.as_str()))
            .one(conn)
            .await
            .map_err(|e| UserError::internal_error(format!("Database error: {}", e)))
    }

    /// Whether any account row exists. Gates the first-user bootstrap.
    pub async fn any_user_exists(&self, conn: &impl ConnectionTrait) -> Result<bool, UserError> {
        let count = User::find()
            .count(conn)
            .await
            .map_err(|e| UserError::internal_error(format!("Database error: {}", e)))?;
        Ok(count > 0)
    }

    /// Whether another account (excluding `exclude_id`) already uses the
    /// normalized email.
    pub async fn email_taken(
        &self,
        conn: &impl ConnectionTrait,
        email: &str,
        exclude_id: i32,
    ) -> Result<bool, UserError> {
        let count = User::find()
            .filter(user::Column::Email.eq(email))
            .filter(user::Column::Id.ne(exclude_id))
            .count(conn)
            .await
            .map_err(|e| UserError::internal_error(format!("Database error: {}", e)))?;
        Ok(count > 0)
    }

    /// All accounts whose roles CSV contains the administrator marker.
    ///
    /// The marker can sit at the start, middle, or end of the CSV, so the
    /// filter is an OR over the four position patterns.
    pub async fn admin_accounts(
        &self,
        conn: &impl ConnectionTrait,
    ) -> Result<Vec<user::Model>, UserError> {
        let marker = ADMIN_ROLE_ID.to_string();
        User::find()
            .filter(
                Condition::any()
                    .add(user::Column::Roles.eq(marker.clone()))
                    .add(user::Column::Roles.like(format!("{},%", marker)))
                    .add(user::Column::Roles.like(format!("%,{},%", marker)))
                    .add(user::Column::Roles.like(format!("%,{}", marker))),
            )
            .all(conn)
            .await
            .map_err(|e| UserError::internal_error(format!("Database error: {}", e)))
    }

    pub async fn list_all(
        &self,
        conn: &impl ConnectionTrait,
    ) -> Result<Vec<user::Model>, UserError> {
        User::find()
            .order_by_asc(user::Column::Id)
            .all(conn)
            .await
            .map_err(|e| UserError::internal_error(format!("Database error: {}", e)))
    }

    /// Insert a new account row and return its id.
    pub async fn insert_user(
        &self,
        conn: &impl ConnectionTrait,
        new_user: NewUser,
    ) -> Result<i32, UserError> {
        let row = user::ActiveModel {
            id: sea_orm::ActiveValue::NotSet,
            email: Set(new_user.email),
            username: Set(new_user.username),
            password: Set(new_user.password_hash),
            status: Set(new_user.status.as_str().to_string()),
            roles: Set(new_user.roles),
            resource_id: Set(None),
            autobiography_id: Set(None),
            created_on: Set(Utc::now().timestamp()),
        };

        let inserted = row.insert(conn).await.map_err(|e| {
            if e.to_string().contains("UNIQUE") {
                UserError::duplicate_email("the supplied address")
            } else {
                UserError::internal_error(format!("Database error: {}", e))
            }
        })?;

        Ok(inserted.id)
    }

    /// Apply the provided field changes to an account row.
    pub async fn update_user(
        &self,
        conn: &impl ConnectionTrait,
        id: i32,
        changes: AccountChanges,
    ) -> Result<(), UserError> {
        let row = user::ActiveModel {
            id: Set(id),
            username: changes
                .username
                .map(Set)
                .unwrap_or(sea_orm::ActiveValue::NotSet),
            email: changes
                .email
                .map(Set)
                .unwrap_or(sea_orm::ActiveValue::NotSet),
            roles: changes
                .roles
                .map(Set)
                .unwrap_or(sea_orm::ActiveValue::NotSet),
            status: changes
                .status
                .map(|s| Set(s.as_str().to_string()))
                .unwrap_or(sea_orm::ActiveValue::NotSet),
            password: changes
                .password_hash
                .map(Set)
                .unwrap_or(sea_orm::ActiveValue::NotSet),
            ..Default::default()
        };

        row.update(conn)
            .await
            .map_err(|e| UserError::internal_error(format!("Database error: {}", e)))?;

        Ok(())
    }

    /// Latest history row for an account, if any.
    pub async fn latest_history(
        &self,
        conn: &impl ConnectionTrait,
        user_id: i32,
    ) -> Result<Option<user_history::Model>, UserError> {
        UserHistory::find()
            .filter(user_history::Column::UserId.eq(user_id))
            .order_by_desc(user_history::Column::Version)
            .one(conn)
            .await
            .map_err(|e| UserError::internal_error(format!("Database error: {}", e)))
    }

    pub async fn insert_history(
        &self,
        conn: &impl ConnectionTrait,
        snapshot: HistorySnapshot,
    ) -> Result<(), UserError> {
        let row = user_history::ActiveModel {
            id: sea_orm::ActiveValue::NotSet,
            user_id: Set(snapshot.user_id),
            version: Set(snapshot.version),
            changed_by: Set(snapshot.changed_by),
            changed_on: Set(Utc::now().timestamp()),
            action: Set(snapshot.action.as_str().to_string()),
            username: Set(snapshot.username),
            email: Set(snapshot.email),
            roles: Set(snapshot.roles),
            status: Set(snapshot.status),
        };

        row.insert(conn)
            .await
            .map_err(|e| UserError::internal_error(format!("Database error: {}", e)))?;

        Ok(())
    }

    /// Full history of an account, oldest version first.
    pub async fn history_rows(
        &self,
        conn: &impl ConnectionTrait,
        user_id: i32,
    ) -> Result<Vec<user_history::Model>, UserError> {
        UserHistory::find()
            .filter(user_history::Column::UserId.eq(user_id))
            .order_by_asc(user_history::Column::Version)
            .all(conn)
            .await
            .map_err(|e| UserError::internal_error(format!("Database error: {}", e)))
    }

    /// Map account ids to usernames, for resolving `changed_by` columns.
    pub async fn usernames_by_ids(
        &self,
        conn: &impl ConnectionTrait,
        ids: &[i32],
    ) -> Result<HashMap<i32, String>, UserError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = User::find()
            .filter(user::Column::Id.is_in(ids.iter().copied()))
            .all(conn)
            .await
            .map_err(|e| UserError::internal_error(format!("Database error: {}", e)))?;

        Ok(rows.into_iter().map(|u| (u.id, u.username)).collect())
    }
}

impl Default for UserStore {
    fn default() -> Self {
        Self::new()
    }
}
