use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::DateTime;
use sea_orm::{DatabaseConnection, TransactionTrait};

use crate::config::Settings;
use crate::errors::UserError;
use crate::services::authorization::{authorize_add_user, authorize_edit_user};
use crate::services::crypto;
use crate::services::mailer::Mailer;
use crate::services::role_resolver::RoleResolver;
use crate::services::token_service::SessionTokenService;
use crate::services::validation::{
    validate_add_user, validate_edit_user, validate_reset_password, validate_reset_request,
    validate_sign_in,
};
use crate::stores::user_store::{AccountChanges, HistorySnapshot, NewUser};
use crate::stores::{ResetStore, RoleStore, UserStore};
use crate::types::dto::common::TableColumn;
use crate::types::dto::user::{
    AddUserRequest, EditUserRequest, PasswordResetRequest, ResetPasswordRequest, SignInRequest,
    SignInResponse, UserHistoryRow, UserHistoryTable, UserRow, UserTable,
};
use crate::types::internal::account::UserAction;
use crate::types::internal::auth::Claims;

/// Result of a sign-in attempt that did not fail outright.
pub enum SignInOutcome {
    SignedIn(SignInResponse),
    /// The bootstrap credentials were presented and no account exists yet;
    /// the client may proceed to the first-user flow.
    FirstUserAvailable,
}

/// Orchestrates the account operations: validate, authorize, then a
/// transactional mutation with its history write and any mail side effect.
///
/// All dependencies are passed in at construction so tests can substitute
/// fakes; nothing here reaches for process-global state.
pub struct AccountService {
    db: DatabaseConnection,
    users: UserStore,
    roles: RoleStore,
    resets: ResetStore,
    resolver: RoleResolver,
    tokens: Arc<SessionTokenService>,
    mailer: Arc<dyn Mailer>,
    settings: Arc<Settings>,
}

impl AccountService {
    pub fn new(
        db: DatabaseConnection,
        tokens: Arc<SessionTokenService>,
        mailer: Arc<dyn Mailer>,
        settings: Arc<Settings>,
    ) -> Self {
        Self {
            db,
            users: UserStore::new(),
            roles: RoleStore::new(),
            resets: ResetStore::new(),
            resolver: RoleResolver::new(),
            tokens,
            mailer,
            settings,
        }
    }

    /// Verify credentials and mint a session token carrying the resolved
    /// privilege snapshot.
    ///
    /// Presenting the configured bootstrap credentials probes the
    /// first-user flow instead: it is available only while the user table
    /// is empty.
    pub async fn sign_in(&self, req: &SignInRequest) -> Result<SignInOutcome, UserError> {
        let args = validate_sign_in(req)?;

        if args.email == self.settings.first_user_email
            && args.password == self.settings.first_user_password
        {
            if self.users.any_user_exists(&self.db).await? {
                return Err(UserError::forbidden("Incorrect username or password."));
            }
            return Ok(SignInOutcome::FirstUserAvailable);
        }

        let user = self
            .users
            .find_active_by_email(&self.db, &args.email)
            .await?
            .ok_or_else(|| UserError::forbidden("Incorrect username or password."))?;

        if !crypto::verify_password(&args.password, &user.password) {
            return Err(UserError::forbidden("Incorrect username or password."));
        }

        let resolved = self.resolver.resolve_single(&self.db, &user.roles).await?;
        let token = self.tokens.issue(
            user.id,
            &user.email,
            &user.username,
            resolved.privileges.clone(),
        )?;

        Ok(SignInOutcome::SignedIn(SignInResponse {
            message: "User authenticated!".to_string(),
            id: user.id,
            username: user.username,
            privileges: resolved.privileges,
            role_ids: resolved.role_ids,
            role_names: resolved.role_names,
            session_token: token,
        }))
    }

    /// Create an account, its version-1 history row, and (outside the
    /// bootstrap flow) a reset code delivered by welcome email. A failed
    /// send rolls the inserted rows back.
    pub async fn add_user(
        &self,
        caller: Option<&Claims>,
        req: &AddUserRequest,
    ) -> Result<(), UserError> {
        let args =
            validate_add_user(&self.db, &self.users, &self.roles, &self.settings, req).await?;

        let caller_privileges = caller.map(|c| c.privileges.as_slice()).unwrap_or(&[]);
        authorize_add_user(&self.db, &self.users, caller_privileges, &args).await?;

        let password_hash = crypto::hash_password(&args.password)?;

        let txn = self.db.begin().await.map_err(|e| {
            UserError::internal_error(format!("Failed to start transaction: {}", e))
        })?;

        let new_id = self
            .users
            .insert_user(
                &txn,
                NewUser {
                    email: args.email.clone(),
                    username: args.username.clone(),
                    password_hash,
                    status: args.status,
                    roles: args.roles.clone(),
                },
            )
            .await?;

        // The first user creates themselves; everyone else is created by
        // the authenticated caller.
        let changed_by = if args.first_user {
            new_id
        } else {
            caller.map(|c| c.id).unwrap_or(new_id)
        };

        self.users
            .insert_history(
                &txn,
                HistorySnapshot {
                    user_id: new_id,
                    version: 1,
                    changed_by,
                    action: UserAction::Add,
                    username: args.username.clone(),
                    email: args.email.clone(),
                    roles: args.roles.clone(),
                    status: args.status.as_str().to_string(),
                },
            )
            .await?;

        if !args.first_user {
            let code = self.resets.issue_code(&txn, new_id).await?;
            let url = format!("{}c/signin/welcome/{}", self.settings.base_url, code);
            let body = format!(
                "<p>Greetings {},</p><p>You've been assigned an account on the Summit Reviews \
                 official website. To get started, please create a password for your account by \
                 clicking <a href=\"{}\">here</a>.</p>",
                args.username, url
            );

            if let Err(e) = self
                .mailer
                .send(&args.email, "Welcome to the Summit Staff Site!", &body)
                .await
            {
                tracing::error!(error = %e, email = %args.email, "add_user: welcome email failed, rolling back");
                txn.rollback().await.map_err(|e| {
                    UserError::internal_error(format!("Failed to roll back transaction: {}", e))
                })?;
                return Err(UserError::internal_error(format!(
                    "User created, but failed to send an email to {}. Aborting...",
                    args.email
                )));
            }
        }

        txn.commit().await.map_err(|e| {
            UserError::internal_error(format!("Failed to commit transaction: {}", e))
        })?;

        Ok(())
    }

    /// Apply a partial edit to an account, recording the next history
    /// version as the previous snapshot with the changes overlaid.
    pub async fn edit_user(
        &self,
        caller: &Claims,
        id: i32,
        req: &EditUserRequest,
    ) -> Result<(), UserError> {
        let args = validate_edit_user(&self.db, &self.users, &self.roles, id, req).await?;

        let current = self
            .users
            .find_by_id(&self.db, id)
            .await?
            .ok_or_else(|| UserError::invalid_parameter(&format!("no user with id {}.", id)))?;

        authorize_edit_user(&self.db, &self.users, caller, &args).await?;

        let password_hash = match &args.password {
            Some(plain) => Some(crypto::hash_password(plain)?),
            None => None,
        };

        let txn = self.db.begin().await.map_err(|e| {
            UserError::internal_error(format!("Failed to start transaction: {}", e))
        })?;

        let (version, base_username, base_email, base_roles, base_status) =
            match self.users.latest_history(&txn, id).await? {
                Some(prev) => (
                    prev.version + 1,
                    prev.username,
                    prev.email,
                    prev.roles,
                    prev.status,
                ),
                // Accounts always get a version-1 row on creation; fall
                // back to the live row just in case.
                None => (
                    1,
                    current.username.clone(),
                    current.email.clone(),
                    current.roles.clone(),
                    current.status.clone(),
                ),
            };

        self.users
            .insert_history(
                &txn,
                HistorySnapshot {
                    user_id: id,
                    version,
                    changed_by: caller.id,
                    action: UserAction::Edit,
                    username: args.username.clone().unwrap_or(base_username),
                    email: args.email.clone().unwrap_or(base_email),
                    roles: args.roles.clone().unwrap_or(base_roles),
                    status: args
                        .status
                        .map(|s| s.as_str().to_string())
                        .unwrap_or(base_status),
                },
            )
            .await?;

        self.users
            .update_user(
                &txn,
                id,
                AccountChanges {
                    username: args.username,
                    email: args.email,
                    roles: args.roles,
                    status: args.status,
                    password_hash,
                },
            )
            .await?;

        txn.commit().await.map_err(|e| {
            UserError::internal_error(format!("Failed to commit transaction: {}", e))
        })?;

        Ok(())
    }

    /// List every account with role names and privileges resolved in.
    pub async fn list_users(&self) -> Result<UserTable, UserError> {
        let accounts = self.users.list_all(&self.db).await?;

        let csvs: Vec<String> = accounts.iter().map(|u| u.roles.clone()).collect();
        let resolved = self.resolver.resolve_many(&self.db, &csvs).await?;

        let rows = accounts
            .into_iter()
            .zip(resolved)
            .map(|(account, roles)| UserRow {
                id: account.id,
                username: account.username,
                email: account.email,
                status: account.status,
                roles: roles.role_names.join(", "),
                privileges: roles.privileges,
                member_since: format_date(account.created_on),
            })
            .collect();

        Ok(UserTable {
            cols: vec![
                TableColumn::new("id", "ID"),
                TableColumn::new("username", "Username"),
                TableColumn::new("email", "Email"),
                TableColumn::new("status", "Status"),
                TableColumn::new("roles", "Roles"),
                TableColumn::new("privileges", "Privileges"),
                TableColumn::new("memberSince", "Member Since"),
            ],
            rows,
        })
    }

    /// The versioned change log of one account, oldest first.
    pub async fn user_history(&self, id: i32) -> Result<UserHistoryTable, UserError> {
        let history = self.users.history_rows(&self.db, id).await?;

        let csvs: Vec<String> = history.iter().map(|h| h.roles.clone()).collect();
        let resolved = self.resolver.resolve_many(&self.db, &csvs).await?;

        let changer_ids: Vec<i32> = history
            .iter()
            .map(|h| h.changed_by)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let changer_names = self.users.usernames_by_ids(&self.db, &changer_ids).await?;

        let rows = history
            .into_iter()
            .zip(resolved)
            .map(|(entry, roles)| UserHistoryRow {
                version: entry.version,
                username: entry.username,
                email: entry.email,
                status: entry.status,
                roles: roles.role_names.join(", "),
                changed_by: changer_names
                    .get(&entry.changed_by)
                    .cloned()
                    .unwrap_or_else(|| entry.changed_by.to_string()),
                changed_on: format_timestamp(entry.changed_on),
                action: entry.action,
            })
            .collect();

        Ok(UserHistoryTable {
            cols: vec![
                TableColumn::new("username", "Username"),
                TableColumn::new("email", "Email"),
                TableColumn::new("status", "Status"),
                TableColumn::new("roles", "Roles"),
                TableColumn::new("changedBy", "Changed By"),
                TableColumn::new("changedOn", "Changed On"),
                TableColumn::new("action", "Action"),
            ],
            rows,
        })
    }

    /// Issue a reset code for an active account and email it. Inactive and
    /// unknown accounts are rejected; a failed send rolls the code back.
    pub async fn request_password_reset(
        &self,
        req: &PasswordResetRequest,
    ) -> Result<(), UserError> {
        let args = validate_reset_request(req)?;

        let txn = self.db.begin().await.map_err(|e| {
            UserError::internal_error(format!("Failed to start transaction: {}", e))
        })?;

        let user = match self.users.find_active_by_email(&txn, &args.email).await? {
            Some(user) => user,
            None => {
                tracing::warn!(email = %args.email, "password reset requested for inactive or unknown account");
                return Err(UserError::forbidden("No active user for supplied Email."));
            }
        };

        let code = self.resets.issue_code(&txn, user.id).await?;
        let url = format!("{}c/signin/reset/{}", self.settings.base_url, code);
        let body = format!(
            "<p>{}, to reset your Summit Reviews password, click <a href=\"{}\">here</a>.</p>",
            user.username, url
        );

        if let Err(e) = self
            .mailer
            .send(&args.email, "Summit Reviews: Password Reset", &body)
            .await
        {
            tracing::error!(error = %e, email = %args.email, "request_password_reset: email failed, rolling back");
            txn.rollback().await.map_err(|e| {
                UserError::internal_error(format!("Failed to roll back transaction: {}", e))
            })?;
            return Err(UserError::internal_error(
                "Failed to request password reset. Please try again later.",
            ));
        }

        txn.commit().await.map_err(|e| {
            UserError::internal_error(format!("Failed to commit transaction: {}", e))
        })?;

        Ok(())
    }

    /// Consume a reset code: set the new password and record the change in
    /// the history as made by the affected account itself.
    pub async fn reset_password(&self, req: &ResetPasswordRequest) -> Result<(), UserError> {
        let args = validate_reset_password(req)?;

        let txn = self.db.begin().await.map_err(|e| {
            UserError::internal_error(format!("Failed to start transaction: {}", e))
        })?;

        let user_id = self
            .resets
            .find_user_by_code(&txn, &args.reset_code)
            .await?
            .ok_or_else(|| UserError::validation("Reset code is invalid."))?;

        self.resets.delete_codes_for_user(&txn, user_id).await?;

        let current = self
            .users
            .find_by_id(&txn, user_id)
            .await?
            .ok_or_else(|| UserError::internal_error("Reset code points at a missing account."))?;

        let (version, username, email, roles, status) =
            match self.users.latest_history(&txn, user_id).await? {
                Some(prev) => (
                    prev.version + 1,
                    prev.username,
                    prev.email,
                    prev.roles,
                    prev.status,
                ),
                None => (
                    1,
                    current.username.clone(),
                    current.email.clone(),
                    current.roles.clone(),
                    current.status.clone(),
                ),
            };

        self.users
            .insert_history(
                &txn,
                HistorySnapshot {
                    user_id,
                    version,
                    changed_by: user_id,
                    action: UserAction::ResetPassword,
                    username,
                    email,
                    roles,
                    status,
                },
            )
            .await?;

        let password_hash = crypto::hash_password(&args.password)?;
        self.users
            .update_user(
                &txn,
                user_id,
                AccountChanges {
                    password_hash: Some(password_hash),
                    ..Default::default()
                },
            )
            .await?;

        txn.commit().await.map_err(|e| {
            UserError::internal_error(format!("Failed to commit transaction: {}", e))
        })?;

        Ok(())
    }
}

fn format_date(timestamp: i64) -> String {
    DateTime::from_timestamp(timestamp, 0)
        .map(|dt| dt.format("%b %d, %Y").to_string())
        .unwrap_or_default()
}

fn format_timestamp(timestamp: i64) -> String {
    DateTime::from_timestamp(timestamp, 0)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_default()
}
