use chrono::Utc;
use sea_orm::ConnectionTrait;

use crate::config::Settings;
use crate::errors::UserError;
use crate::stores::{RoleStore, UserStore};
use crate::types::dto::user::{
    AddUserRequest, EditUserRequest, PasswordResetRequest, ResetPasswordRequest, SignInRequest,
};
use crate::types::internal::account::UserStatus;
use crate::types::internal::roles::{Role, RoleSet, ADMIN_ROLE_ID};

const MAX_EMAIL_LEN: usize = 256;
const MAX_USERNAME_LEN: usize = 128;
const MAX_PASSWORD_LEN: usize = 64;

/// Normalized arguments for an add-user request
#[derive(Debug)]
pub struct ValidatedAddUser {
    pub email: String,
    pub username: String,
    /// Explicit for the bootstrap flow; otherwise a placeholder the reset
    /// flow overwrites
    pub password: String,
    /// Canonical roles CSV (sorted, deduplicated)
    pub roles: String,
    pub status: UserStatus,
    pub first_user: bool,
}

/// Normalized arguments for an edit-user request
#[derive(Debug)]
pub struct ValidatedEditUser {
    pub id: i32,
    pub username: Option<String>,
    pub password: Option<String>,
    pub email: Option<String>,
    /// Canonical roles CSV (sorted, deduplicated)
    pub roles: Option<String>,
    pub status: Option<UserStatus>,
}

#[derive(Debug)]
pub struct ValidatedSignIn {
    pub email: String,
    pub password: String,
}

#[derive(Debug)]
pub struct ValidatedResetRequest {
    pub email: String,
}

#[derive(Debug)]
pub struct ValidatedResetPassword {
    pub reset_code: String,
    pub password: String,
}

/// Validate an add-user request and produce normalized arguments.
///
/// The bootstrap mode is entered only when the extra credentials match the
/// configured pair; it forces the administrator role and active status and
/// accepts the explicit password. Whether the bootstrap may actually run
/// (empty user table) is the authorization gate's concern, not this one's.
pub async fn validate_add_user(
    conn: &impl ConnectionTrait,
    users: &UserStore,
    roles: &RoleStore,
    settings: &Settings,
    req: &AddUserRequest,
) -> Result<ValidatedAddUser, UserError> {
    let first_user = match &req.first_user {
        Some(credentials) => {
            if credentials.email.as_deref() != Some(settings.first_user_email.as_str()) {
                return Err(UserError::validation("Unrecognized email address."));
            }
            if credentials.password.as_deref() != Some(settings.first_user_password.as_str()) {
                return Err(UserError::validation("Unrecognized password."));
            }
            if req.password.as_deref().unwrap_or("").is_empty() {
                return Err(UserError::missing_parameter("Password is required."));
            }
            true
        }
        None => false,
    };

    let email = req
        .email
        .as_deref()
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
        .ok_or_else(|| UserError::missing_parameter("email is required."))?;
    if email.len() > MAX_EMAIL_LEN {
        return Err(UserError::exceeded_length(
            "email address is limited to 256 characters.",
        ));
    }

    let username = req
        .username
        .clone()
        .filter(|u| !u.is_empty())
        .ok_or_else(|| UserError::missing_parameter("username is required."))?;
    if username.len() > MAX_USERNAME_LEN {
        return Err(UserError::exceeded_length(
            "username is limited to 128 characters.",
        ));
    }

    // Only the bootstrap request may set the password directly. Ordinary
    // adds get a placeholder that the password-reset flow replaces.
    let password = if first_user {
        req.password.clone().unwrap_or_default()
    } else {
        Utc::now().timestamp_millis().to_string()
    };
    if password.len() > MAX_PASSWORD_LEN {
        return Err(UserError::exceeded_length(
            "password is limited to 64 characters.",
        ));
    }

    // Anything other than an explicit "inactive" creates an active account.
    let status = if first_user {
        UserStatus::Active
    } else if req.status.as_deref() == Some(UserStatus::Inactive.as_str()) {
        UserStatus::Inactive
    } else {
        UserStatus::Active
    };

    if users.email_taken(conn, &email, 0).await? {
        return Err(UserError::duplicate_email(&email));
    }

    let raw_roles = if first_user {
        ADMIN_ROLE_ID.to_string()
    } else {
        req.roles.clone().unwrap_or_default()
    };
    let roles = if raw_roles.trim().is_empty() {
        String::new()
    } else {
        validate_roles(conn, roles, &raw_roles).await?
    };

    Ok(ValidatedAddUser {
        email,
        username,
        password,
        roles,
        status,
        first_user,
    })
}

/// Validate an edit-user request. At least one mutable field is required.
pub async fn validate_edit_user(
    conn: &impl ConnectionTrait,
    users: &UserStore,
    roles: &RoleStore,
    id: i32,
    req: &EditUserRequest,
) -> Result<ValidatedEditUser, UserError> {
    let no_changes = req.username.is_none()
        && req.password.is_none()
        && req.email.is_none()
        && req.roles.is_none()
        && req.status.is_none();
    if no_changes {
        return Err(UserError::missing_parameter("No changes are requested."));
    }

    if let Some(email) = &req.email {
        if email.len() > MAX_EMAIL_LEN {
            return Err(UserError::exceeded_length(
                "email address is limited to 256 characters.",
            ));
        }
    }
    if let Some(username) = &req.username {
        if username.len() > MAX_USERNAME_LEN {
            return Err(UserError::exceeded_length(
                "username is limited to 128 characters.",
            ));
        }
    }
    if let Some(password) = &req.password {
        if password.len() > MAX_PASSWORD_LEN {
            return Err(UserError::exceeded_length(
                "password is limited to 64 characters.",
            ));
        }
    }

    let status = match &req.status {
        Some(raw) => Some(
            UserStatus::parse(raw)
                .ok_or_else(|| UserError::invalid_parameter(&format!("{} is not a valid status", raw)))?,
        ),
        None => None,
    };

    let email = match &req.email {
        Some(raw) => {
            let normalized = raw.trim().to_lowercase();
            if users.email_taken(conn, &normalized, id).await? {
                return Err(UserError::duplicate_email(&normalized));
            }
            Some(normalized)
        }
        None => None,
    };

    let roles_csv = match &req.roles {
        Some(raw) => Some(validate_roles(conn, roles, raw).await?),
        None => None,
    };

    Ok(ValidatedEditUser {
        id,
        username: req.username.clone(),
        password: req.password.clone(),
        email,
        roles: roles_csv,
        status,
    })
}

/// Validate and canonicalize a CSV of role ids.
///
/// Parses strictly (a non-numeric fragment is a 400), deduplicates, sorts
/// ascending, then checks every id against the persisted catalog with a
/// single forward merge scan. The administrator marker is accepted without
/// a catalog row. Returns the canonical CSV.
pub async fn validate_roles(
    conn: &impl ConnectionTrait,
    roles: &RoleStore,
    csv: &str,
) -> Result<String, UserError> {
    let set = RoleSet::parse(csv).map_err(|fragment| {
        UserError::invalid_parameter(&format!("\"{}\" is not a valid role ID.", fragment))
    })?;

    let catalog_ids = roles.sorted_ids(conn).await?;

    // Both sequences are sorted ascending, so one forward pointer suffices.
    let mut j = 0;
    for &candidate in set.ids() {
        match Role::from_id(candidate) {
            Role::AdminMarker => continue,
            Role::Persisted(id) => {
                while j < catalog_ids.len() && catalog_ids[j] < id {
                    j += 1;
                }
                if j < catalog_ids.len() && catalog_ids[j] == id {
                    j += 1;
                    continue;
                }
                return Err(UserError::invalid_parameter(&format!(
                    "\"{}\" is not a valid role ID.",
                    id
                )));
            }
        }
    }

    Ok(set.to_csv())
}

/// Validate a sign-in request. Nothing is being stored, so only presence
/// is checked.
pub fn validate_sign_in(req: &SignInRequest) -> Result<ValidatedSignIn, UserError> {
    let email = req
        .email
        .clone()
        .filter(|e| !e.is_empty())
        .ok_or_else(|| UserError::missing_parameter("email is required."))?;
    let password = req
        .password
        .clone()
        .filter(|p| !p.is_empty())
        .ok_or_else(|| UserError::missing_parameter("password is required."))?;

    Ok(ValidatedSignIn { email, password })
}

/// Validate a password-reset request
pub fn validate_reset_request(req: &PasswordResetRequest) -> Result<ValidatedResetRequest, UserError> {
    let email = req
        .email
        .clone()
        .filter(|e| !e.is_empty())
        .ok_or_else(|| UserError::missing_parameter("email is required."))?;

    Ok(ValidatedResetRequest { email })
}

/// Validate a reset-code consumption request
pub fn validate_reset_password(
    req: &ResetPasswordRequest,
) -> Result<ValidatedResetPassword, UserError> {
    let reset_code = req
        .reset_code
        .clone()
        .filter(|c| !c.is_empty())
        .ok_or_else(|| UserError::missing_parameter("reset code is required."))?;
    let password = req
        .password
        .clone()
        .filter(|p| !p.is_empty())
        .ok_or_else(|| UserError::missing_parameter("password is required."))?;
    if password.len() > MAX_PASSWORD_LEN {
        return Err(UserError::exceeded_length(
            "password is limited to 64 characters.",
        ));
    }

    Ok(ValidatedResetPassword {
        reset_code,
        password,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};

    use crate::config::settings::SmtpSettings;
    use crate::types::db::role;
    use crate::types::dto::user::FirstUserCredentials;

    async fn setup_db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("Failed to create test database");
        Migrator::up(&db, None).await.expect("Failed to run migrations");
        db
    }

    async fn seed_role(db: &DatabaseConnection, id: i32, name: &str, privileges: &str) {
        role::ActiveModel {
            id: Set(id),
            name: Set(name.to_string()),
            privileges: Set(privileges.to_string()),
        }
        .insert(db)
        .await
        .expect("Failed to seed role");
    }

    fn test_settings() -> Settings {
        Settings {
            server_host: "127.0.0.1".to_string(),
            server_port: 3000,
            database_url: "sqlite::memory:".to_string(),
            jwt_secret: "test-secret-key-minimum-32-characters-long".to_string(),
            session_timeout_hours: 24,
            base_url: "http://localhost:3000/".to_string(),
            first_user_email: "founder@summitreviews.net".to_string(),
            first_user_password: "bootstrap-password".to_string(),
            smtp: SmtpSettings {
                host: "localhost".to_string(),
                port: 465,
                username: String::new(),
                password: String::new(),
                from: "noreply@summitreviews.net".to_string(),
            },
        }
    }

    fn add_request(email: &str, username: &str) -> AddUserRequest {
        AddUserRequest {
            email: Some(email.to_string()),
            username: Some(username.to_string()),
            password: None,
            roles: None,
            status: None,
            first_user: None,
        }
    }

    #[tokio::test]
    async fn validate_roles_sorts_and_dedups() {
        let db = setup_db().await;
        seed_role(&db, 1, "Reviewer", "3").await;
        seed_role(&db, 3, "Editor", "4").await;

        let canonical = validate_roles(&db, &RoleStore::new(), "3,1,1").await.unwrap();

        assert_eq!(canonical, "1,3");
    }

    #[tokio::test]
    async fn validate_roles_accepts_admin_marker_without_catalog() {
        let db = setup_db().await;

        let canonical = validate_roles(&db, &RoleStore::new(), "0").await.unwrap();

        assert_eq!(canonical, "0");
    }

    #[tokio::test]
    async fn validate_roles_rejects_unknown_ids() {
        let db = setup_db().await;
        seed_role(&db, 1, "Reviewer", "3").await;

        let err = validate_roles(&db, &RoleStore::new(), "1,7").await.unwrap_err();

        assert_eq!(err.status_code(), 400);
        assert!(err.message().contains("\"7\" is not a valid role ID."));
    }

    #[tokio::test]
    async fn validate_roles_rejects_non_numeric_fragments() {
        let db = setup_db().await;

        let err = validate_roles(&db, &RoleStore::new(), "1,zebra")
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), 400);
        assert!(err.message().contains("\"zebra\" is not a valid role ID."));
    }

    #[tokio::test]
    async fn add_user_normalizes_email_and_generates_placeholder_password() {
        let db = setup_db().await;
        let settings = test_settings();

        let req = add_request("  Staff@SummitReviews.NET ", "staffer");
        let args = validate_add_user(&db, &UserStore::new(), &RoleStore::new(), &settings, &req)
            .await
            .unwrap();

        assert_eq!(args.email, "staff@summitreviews.net");
        assert!(!args.first_user);
        assert_eq!(args.status, UserStatus::Active);
        // Placeholder is a millisecond timestamp, not a caller-chosen value
        assert!(args.password.parse::<i64>().is_ok());
    }

    #[tokio::test]
    async fn add_user_requires_email_and_username() {
        let db = setup_db().await;
        let settings = test_settings();

        let mut req = add_request("a@b.c", "staffer");
        req.email = None;
        let err = validate_add_user(&db, &UserStore::new(), &RoleStore::new(), &settings, &req)
            .await
            .unwrap_err();
        assert!(err.message().contains("email is required."));

        let mut req = add_request("a@b.c", "staffer");
        req.username = None;
        let err = validate_add_user(&db, &UserStore::new(), &RoleStore::new(), &settings, &req)
            .await
            .unwrap_err();
        assert!(err.message().contains("username is required."));
    }

    #[tokio::test]
    async fn add_user_enforces_length_ceilings() {
        let db = setup_db().await;
        let settings = test_settings();

        let mut req = add_request("a@b.c", "staffer");
        req.email = Some(format!("{}@b.c", "a".repeat(300)));
        let err = validate_add_user(&db, &UserStore::new(), &RoleStore::new(), &settings, &req)
            .await
            .unwrap_err();
        assert!(err.message().contains("256"));

        let mut req = add_request("a@b.c", "staffer");
        req.username = Some("u".repeat(200));
        let err = validate_add_user(&db, &UserStore::new(), &RoleStore::new(), &settings, &req)
            .await
            .unwrap_err();
        assert!(err.message().contains("128"));
    }

    #[tokio::test]
    async fn bootstrap_forces_admin_role_and_active_status() {
        let db = setup_db().await;
        let settings = test_settings();

        let mut req = add_request("founder@summitreviews.net", "founder");
        req.password = Some("first-password".to_string());
        req.status = Some("inactive".to_string());
        req.roles = Some("1,2".to_string());
        req.first_user = Some(FirstUserCredentials {
            email: Some(settings.first_user_email.clone()),
            password: Some(settings.first_user_password.clone()),
        });

        let args = validate_add_user(&db, &UserStore::new(), &RoleStore::new(), &settings, &req)
            .await
            .unwrap();

        assert!(args.first_user);
        assert_eq!(args.roles, "0");
        assert_eq!(args.status, UserStatus::Active);
        assert_eq!(args.password, "first-password");
    }

    #[tokio::test]
    async fn bootstrap_with_wrong_credentials_is_rejected() {
        let db = setup_db().await;
        let settings = test_settings();

        let mut req = add_request("founder@summitreviews.net", "founder");
        req.password = Some("first-password".to_string());
        req.first_user = Some(FirstUserCredentials {
            email: Some(settings.first_user_email.clone()),
            password: Some("guess".to_string()),
        });

        let err = validate_add_user(&db, &UserStore::new(), &RoleStore::new(), &settings, &req)
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), 400);
        assert_eq!(err.message(), "Unrecognized password.");
    }

    #[tokio::test]
    async fn edit_user_requires_at_least_one_change() {
        let db = setup_db().await;

        let req = EditUserRequest {
            username: None,
            password: None,
            email: None,
            roles: None,
            status: None,
        };
        let err = validate_edit_user(&db, &UserStore::new(), &RoleStore::new(), 1, &req)
            .await
            .unwrap_err();

        assert!(err.message().contains("No changes are requested."));
    }

    #[tokio::test]
    async fn edit_user_rejects_unknown_status() {
        let db = setup_db().await;

        let req = EditUserRequest {
            username: None,
            password: None,
            email: None,
            roles: None,
            status: Some("suspended".to_string()),
        };
        let err = validate_edit_user(&db, &UserStore::new(), &RoleStore::new(), 1, &req)
            .await
            .unwrap_err();

        assert!(err.message().contains("suspended is not a valid status"));
    }

    async fn seed_user(db: &DatabaseConnection, email: &str, username: &str) -> i32 {
        use sea_orm::ActiveValue::NotSet;
        crate::types::db::user::ActiveModel {
            id: NotSet,
            email: Set(email.to_string()),
            username: Set(username.to_string()),
            password: Set("$argon2id$placeholder".to_string()),
            status: Set("active".to_string()),
            roles: Set(String::new()),
            resource_id: Set(None),
            autobiography_id: Set(None),
            created_on: Set(chrono::Utc::now().timestamp()),
        }
        .insert(db)
        .await
        .expect("Failed to seed user")
        .id
    }

    #[tokio::test]
    async fn edit_rejects_an_email_used_by_another_account() {
        let db = setup_db().await;
        seed_user(&db, "first@summitreviews.net", "first").await;
        let second = seed_user(&db, "second@summitreviews.net", "second").await;

        let req = EditUserRequest {
            username: None,
            password: None,
            email: Some("First@SummitReviews.net".to_string()),
            roles: None,
            status: None,
        };
        let err = validate_edit_user(&db, &UserStore::new(), &RoleStore::new(), second, &req)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert!(err.message().contains("already exists"));

        // Keeping one's own email is not a collision.
        let req = EditUserRequest {
            username: None,
            password: None,
            email: Some("second@summitreviews.net".to_string()),
            roles: None,
            status: None,
        };
        let args = validate_edit_user(&db, &UserStore::new(), &RoleStore::new(), second, &req)
            .await
            .unwrap();
        assert_eq!(args.email.as_deref(), Some("second@summitreviews.net"));
    }

    #[test]
    fn reset_password_requires_code_and_password() {
        let err = validate_reset_password(&ResetPasswordRequest {
            reset_code: None,
            password: Some("pw".to_string()),
        })
        .unwrap_err();
        assert!(err.message().contains("reset code is required."));

        let err = validate_reset_password(&ResetPasswordRequest {
            reset_code: Some("abc123".to_string()),
            password: None,
        })
        .unwrap_err();
        assert!(err.message().contains("password is required."));
    }
}
