use poem_openapi::{payload::Json, ApiResponse, Object};
use serde::{Deserialize, Serialize};

use crate::types::dto::common::TableColumn;

/// Request model for staff sign-in
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct SignInRequest {
    /// Account email
    pub email: Option<String>,

    /// Account password
    pub password: Option<String>,
}

/// Successful sign-in payload: identity, resolved privileges, and the
/// session token
#[derive(Object, Debug, Serialize, Deserialize)]
#[oai(rename_all = "camelCase")]
pub struct SignInResponse {
    /// Outcome message
    pub message: String,

    /// User id
    pub id: i32,

    /// Account username
    pub username: String,

    /// Resolved privilege ids (deduplicated, ascending)
    pub privileges: Vec<i32>,

    /// Role ids as stored on the account
    pub role_ids: Vec<i32>,

    /// Names of the roles assigned to the account
    pub role_names: Vec<String>,

    /// Signed session token (pass as `Authorization: Bearer <token>`)
    pub session_token: String,
}

/// Sign-in rejection body. `first_user` is set when the bootstrap
/// credentials were presented and no account exists yet.
#[derive(Object, Debug, Serialize, Deserialize)]
#[oai(rename_all = "camelCase")]
pub struct SignInRejection {
    /// Outcome message (empty for the bootstrap probe)
    pub message: String,

    /// Present and true when the first-user flow may proceed
    pub first_user: Option<bool>,
}

/// API response for the sign-in endpoint
#[derive(ApiResponse)]
pub enum SignInApiResponse {
    /// Authenticated; session token issued
    #[oai(status = 200)]
    Ok(Json<SignInResponse>),

    /// Bootstrap credentials accepted while the user table is empty
    #[oai(status = 403)]
    FirstUser(Json<SignInRejection>),
}

/// Bootstrap credentials accompanying a first-user add request
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct FirstUserCredentials {
    /// Must match the configured bootstrap email
    pub email: Option<String>,

    /// Must match the configured bootstrap password
    pub password: Option<String>,
}

/// Request model for creating an account
#[derive(Object, Debug, Serialize, Deserialize)]
#[oai(rename_all = "camelCase")]
pub struct AddUserRequest {
    /// Account email (required, unique)
    pub email: Option<String>,

    /// Account username (required)
    pub username: Option<String>,

    /// Only honored for the first-user bootstrap; ordinary adds set the
    /// password through the reset flow
    pub password: Option<String>,

    /// CSV of role ids to assign
    pub roles: Option<String>,

    /// `active` or `inactive`; defaults to active
    pub status: Option<String>,

    /// Bootstrap credentials; present only on the first-user flow
    pub first_user: Option<FirstUserCredentials>,
}

/// Request model for editing an account. At least one mutable field must
/// be supplied.
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct EditUserRequest {
    /// New username
    pub username: Option<String>,

    /// New password (self-edits only)
    pub password: Option<String>,

    /// New email (must stay unique)
    pub email: Option<String>,

    /// New CSV of role ids
    pub roles: Option<String>,

    /// New status (`active` or `inactive`)
    pub status: Option<String>,
}

/// One row of the staff user listing
#[derive(Object, Debug, Serialize, Deserialize)]
#[oai(rename_all = "camelCase")]
pub struct UserRow {
    /// User id
    pub id: i32,

    /// Account username
    pub username: String,

    /// Account email
    pub email: String,

    /// Account status
    pub status: String,

    /// Role names joined for display
    pub roles: String,

    /// Resolved privilege ids
    pub privileges: Vec<i32>,

    /// Account creation date, formatted for display
    pub member_since: String,
}

/// Table payload for the user listing
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct UserTable {
    pub cols: Vec<TableColumn>,
    pub rows: Vec<UserRow>,
}

/// Response model for the user listing endpoint
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct UserListResponse {
    /// Outcome message
    pub message: String,

    /// Column descriptors and resolved rows
    pub data: UserTable,
}

/// One versioned change record of an account
#[derive(Object, Debug, Serialize, Deserialize)]
#[oai(rename_all = "camelCase")]
pub struct UserHistoryRow {
    /// Per-account version, ascending from 1
    pub version: i32,

    /// Username at the time of the change
    pub username: String,

    /// Email at the time of the change
    pub email: String,

    /// Status at the time of the change
    pub status: String,

    /// Role names at the time of the change, joined for display
    pub roles: String,

    /// Username of the account that made the change
    pub changed_by: String,

    /// When the change happened (ISO 8601)
    pub changed_on: String,

    /// Action recorded for the change
    pub action: String,
}

/// Table payload for the account history endpoint
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct UserHistoryTable {
    pub cols: Vec<TableColumn>,
    pub rows: Vec<UserHistoryRow>,
}

/// Response model for the account history endpoint
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct UserHistoryResponse {
    /// Outcome message
    pub message: String,

    /// Column descriptors and versioned rows
    pub data: UserHistoryTable,
}

/// Request model for asking for a password reset email
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct PasswordResetRequest {
    /// Email of the account to reset
    pub email: Option<String>,
}

/// Request model for consuming a reset code
#[derive(Object, Debug, Serialize, Deserialize)]
#[oai(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    /// One-time reset code from the reset email
    pub reset_code: Option<String>,

    /// New password
    pub password: Option<String>,
}
