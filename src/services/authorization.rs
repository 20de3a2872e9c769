use sea_orm::ConnectionTrait;

use crate::errors::UserError;
use crate::services::validation::{ValidatedAddUser, ValidatedEditUser};
use crate::stores::UserStore;
use crate::types::internal::account::UserStatus;
use crate::types::internal::auth::Claims;
use crate::types::internal::roles::{
    ADMIN_ROLE_ID, PRIVILEGE_ALL, PRIVILEGE_EDIT_ROLES, PRIVILEGE_EDIT_USERS,
};

/// Authorize an add-user request.
///
/// Ordinary adds need All Privileges or Edit Users (plus the role-change
/// rule when roles are being assigned). The bootstrap flow ignores
/// privileges entirely but may only run while the user table is empty.
pub async fn authorize_add_user(
    conn: &impl ConnectionTrait,
    users: &UserStore,
    privileges: &[i32],
    args: &ValidatedAddUser,
) -> Result<(), UserError> {
    if args.first_user {
        if users.any_user_exists(conn).await? {
            return Err(UserError::invalid_action(
                "Users are already present in the system. First user request cannot be executed.",
            ));
        }
        return Ok(());
    }

    let admin = privileges.contains(&PRIVILEGE_ALL);
    let edit_users = privileges.contains(&PRIVILEGE_EDIT_USERS);
    if !(admin || edit_users) {
        return Err(UserError::not_authorized(
            "Insufficient privileges to add users.",
        ));
    }

    if !args.roles.is_empty() {
        authorize_role_change(privileges, &args.roles)?;
    }

    Ok(())
}

/// Authorize an edit-user request.
///
/// Looks up every admin account first: special rules apply when the target
/// is an administrator, and an edit that would deactivate or demote the
/// sole active administrator is rejected outright.
pub async fn authorize_edit_user(
    conn: &impl ConnectionTrait,
    users: &UserStore,
    caller: &Claims,
    args: &ValidatedEditUser,
) -> Result<(), UserError> {
    let admin = caller.has_privilege(PRIVILEGE_ALL);
    let edit_users = caller.has_privilege(PRIVILEGE_EDIT_USERS);

    let admins = users.admin_accounts(conn).await?;
    let target = admins.iter().find(|account| account.id == args.id);
    let target_is_admin = target.is_some();

    let last_admin = match target {
        Some(target) if target.status == UserStatus::Active.as_str() => {
            let active_admins = admins
                .iter()
                .filter(|account| account.status == UserStatus::Active.as_str())
                .count();
            active_admins < 2
        }
        _ => false,
    };

    if last_admin {
        let deactivates = args.status == Some(UserStatus::Inactive);
        let strips_admin = args
            .roles
            .as_deref()
            .map(|csv| !csv_contains_admin(csv))
            .unwrap_or(false);
        if deactivates || strips_admin {
            return Err(UserError::no_admins());
        }
    }

    if caller.id != args.id {
        if !(admin || edit_users) {
            return Err(UserError::not_authorized(
                "Insufficient privileges to edit users.",
            ));
        }
        if target_is_admin && !admin {
            return Err(UserError::not_authorized(
                "Only admins can edit admin accounts.",
            ));
        }
        if args.password.is_some() {
            return Err(UserError::not_authorized(
                "Cannot change another user's password.",
            ));
        }
    }

    if args.status.is_some() && !(admin || edit_users) {
        return Err(UserError::not_authorized(
            "Insufficient privileges to edit users.",
        ));
    }

    if let Some(roles) = &args.roles {
        authorize_role_change(&caller.privileges, roles)?;
    }

    Ok(())
}

/// Shared rule for assigning roles to an account.
///
/// Granting or retaining the administrator marker requires All Privileges;
/// any other assignment needs All Privileges or Edit Roles.
pub fn authorize_role_change(privileges: &[i32], roles_csv: &str) -> Result<(), UserError> {
    let admin = privileges.contains(&PRIVILEGE_ALL);
    let edit_roles = privileges.contains(&PRIVILEGE_EDIT_ROLES);
    let adding_admin = csv_contains_admin(roles_csv);

    if !(admin || edit_roles) {
        return Err(UserError::not_authorized(
            "Insufficient privileges to alter user roles.",
        ));
    }
    if adding_admin && !admin {
        return Err(UserError::not_authorized(
            "Insufficient privileges to assign the admin role.",
        ));
    }

    Ok(())
}

fn csv_contains_admin(csv: &str) -> bool {
    crate::types::internal::roles::RoleSet::parse_raw(csv).contains(&ADMIN_ROLE_ID)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};

    use crate::types::db::user;

    fn claims(id: i32, privileges: Vec<i32>) -> Claims {
        let now = Utc::now().timestamp();
        Claims {
            id,
            email: format!("user{}@summitreviews.net", id),
            name: format!("user{}", id),
            privileges,
            iat: now,
            exp: now + 3600,
        }
    }

    fn edit_args(id: i32) -> ValidatedEditUser {
        ValidatedEditUser {
            id,
            username: None,
            password: None,
            email: None,
            roles: None,
            status: None,
        }
    }

    async fn setup_db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("Failed to create test database");
        Migrator::up(&db, None).await.expect("Failed to run migrations");
        db
    }

    async fn seed_user(db: &DatabaseConnection, username: &str, roles: &str, status: &str) -> i32 {
        let row = user::ActiveModel {
            id: sea_orm::ActiveValue::NotSet,
            email: Set(format!("{}@summitreviews.net", username)),
            username: Set(username.to_string()),
            password: Set("$argon2id$placeholder".to_string()),
            status: Set(status.to_string()),
            roles: Set(roles.to_string()),
            resource_id: Set(None),
            autobiography_id: Set(None),
            created_on: Set(Utc::now().timestamp()),
        };
        row.insert(db).await.expect("Failed to seed user").id
    }

    #[test]
    fn role_change_needs_edit_roles_or_admin() {
        assert!(authorize_role_change(&[PRIVILEGE_ALL], "1,2").is_ok());
        assert!(authorize_role_change(&[PRIVILEGE_EDIT_ROLES], "1,2").is_ok());

        let err = authorize_role_change(&[PRIVILEGE_EDIT_USERS], "1,2").unwrap_err();
        assert_eq!(err.status_code(), 401);
    }

    #[test]
    fn only_admins_grant_the_admin_role() {
        assert!(authorize_role_change(&[PRIVILEGE_ALL], "0,2").is_ok());

        let err = authorize_role_change(&[PRIVILEGE_EDIT_ROLES], "0,2").unwrap_err();
        assert_eq!(err.status_code(), 401);
        assert!(err.message().contains("assign the admin role"));
    }

    #[tokio::test]
    async fn add_user_needs_edit_users_or_admin() {
        let db = setup_db().await;
        let users = UserStore::new();
        let args = ValidatedAddUser {
            email: "new@summitreviews.net".to_string(),
            username: "new".to_string(),
            password: "x".to_string(),
            roles: String::new(),
            status: UserStatus::Active,
            first_user: false,
        };

        assert!(authorize_add_user(&db, &users, &[PRIVILEGE_EDIT_USERS], &args)
            .await
            .is_ok());

        let err = authorize_add_user(&db, &users, &[PRIVILEGE_EDIT_ROLES], &args)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 401);
    }

    #[tokio::test]
    async fn bootstrap_is_rejected_once_any_user_exists() {
        let db = setup_db().await;
        let users = UserStore::new();
        seed_user(&db, "existing", "0", "active").await;

        let args = ValidatedAddUser {
            email: "founder@summitreviews.net".to_string(),
            username: "founder".to_string(),
            password: "x".to_string(),
            roles: "0".to_string(),
            status: UserStatus::Active,
            first_user: true,
        };

        let err = authorize_add_user(&db, &users, &[], &args).await.unwrap_err();
        assert_eq!(err.status_code(), 405);
    }

    #[tokio::test]
    async fn sole_active_admin_cannot_be_deactivated() {
        let db = setup_db().await;
        let users = UserStore::new();
        let admin_id = seed_user(&db, "admin", "0", "active").await;

        let mut args = edit_args(admin_id);
        args.status = Some(UserStatus::Inactive);

        let err = authorize_edit_user(&db, &users, &claims(admin_id, vec![PRIVILEGE_ALL]), &args)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 403);
        assert!(err.message().contains("last active admin"));
    }

    #[tokio::test]
    async fn sole_active_admin_cannot_lose_the_admin_role() {
        let db = setup_db().await;
        let users = UserStore::new();
        let admin_id = seed_user(&db, "admin", "0", "active").await;

        let mut args = edit_args(admin_id);
        args.roles = Some("1".to_string());

        let err = authorize_edit_user(&db, &users, &claims(admin_id, vec![PRIVILEGE_ALL]), &args)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 403);
    }

    #[tokio::test]
    async fn deactivation_is_allowed_with_a_second_active_admin() {
        let db = setup_db().await;
        let users = UserStore::new();
        let first = seed_user(&db, "admin1", "0", "active").await;
        seed_user(&db, "admin2", "0", "active").await;

        let mut args = edit_args(first);
        args.status = Some(UserStatus::Inactive);

        assert!(
            authorize_edit_user(&db, &users, &claims(first, vec![PRIVILEGE_ALL]), &args)
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn inactive_admins_do_not_count_toward_the_quorum() {
        let db = setup_db().await;
        let users = UserStore::new();
        let active = seed_user(&db, "admin1", "0", "active").await;
        seed_user(&db, "admin2", "0", "inactive").await;

        let mut args = edit_args(active);
        args.status = Some(UserStatus::Inactive);

        let err = authorize_edit_user(&db, &users, &claims(active, vec![PRIVILEGE_ALL]), &args)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 403);
    }

    #[tokio::test]
    async fn admin_marker_is_found_in_any_csv_position() {
        let db = setup_db().await;
        let users = UserStore::new();
        // Admin marker at end of CSV; a naive equality filter would miss it.
        let target = seed_user(&db, "admin", "1,0", "active").await;

        let mut args = edit_args(target);
        args.status = Some(UserStatus::Inactive);

        let err = authorize_edit_user(&db, &users, &claims(target, vec![PRIVILEGE_ALL]), &args)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 403);
    }

    #[tokio::test]
    async fn editing_another_account_needs_edit_users() {
        let db = setup_db().await;
        let users = UserStore::new();
        let target = seed_user(&db, "writer", "1", "active").await;

        let mut args = edit_args(target);
        args.username = Some("renamed".to_string());

        let err = authorize_edit_user(&db, &users, &claims(target + 1, vec![]), &args)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 401);
    }

    #[tokio::test]
    async fn non_admins_cannot_edit_admin_accounts() {
        let db = setup_db().await;
        let users = UserStore::new();
        seed_user(&db, "admin1", "0", "active").await;
        let target = seed_user(&db, "admin2", "0", "active").await;

        let mut args = edit_args(target);
        args.username = Some("renamed".to_string());

        let err = authorize_edit_user(
            &db,
            &users,
            &claims(target + 10, vec![PRIVILEGE_EDIT_USERS]),
            &args,
        )
        .await
        .unwrap_err();
        assert_eq!(err.status_code(), 401);
        assert!(err.message().contains("Only admins can edit admin accounts."));
    }

    #[tokio::test]
    async fn non_self_edits_may_not_change_the_password() {
        let db = setup_db().await;
        let users = UserStore::new();
        let target = seed_user(&db, "writer", "", "active").await;

        let mut args = edit_args(target);
        args.password = Some("hijacked".to_string());

        let err = authorize_edit_user(&db, &users, &claims(target + 1, vec![PRIVILEGE_ALL]), &args)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 401);
        assert!(err.message().contains("Cannot change another user's password."));
    }

    #[tokio::test]
    async fn self_edit_of_own_password_needs_no_privileges() {
        let db = setup_db().await;
        let users = UserStore::new();
        let me = seed_user(&db, "writer", "", "active").await;

        let mut args = edit_args(me);
        args.password = Some("new-password".to_string());

        assert!(authorize_edit_user(&db, &users, &claims(me, vec![]), &args)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn status_changes_need_edit_users_even_on_self() {
        let db = setup_db().await;
        let users = UserStore::new();
        let me = seed_user(&db, "writer", "", "active").await;

        let mut args = edit_args(me);
        args.status = Some(UserStatus::Inactive);

        let err = authorize_edit_user(&db, &users, &claims(me, vec![]), &args)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 401);
    }
}
