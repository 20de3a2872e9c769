use std::sync::Arc;

use poem_openapi::{auth::Bearer, param::Path, payload::Json, OpenApi, SecurityScheme, Tags};

use crate::errors::UserError;
use crate::services::{AccountService, SessionTokenService, SignInOutcome};
use crate::types::dto::common::MessageResponse;
use crate::types::dto::user::{
    AddUserRequest, EditUserRequest, PasswordResetRequest, ResetPasswordRequest, SignInApiResponse,
    SignInRejection, SignInRequest, UserHistoryResponse, UserListResponse,
};

/// Staff-site API endpoints: sessions, accounts, and password resets
pub struct StaffApi {
    accounts: Arc<AccountService>,
    tokens: Arc<SessionTokenService>,
}

impl StaffApi {
    pub fn new(accounts: Arc<AccountService>, tokens: Arc<SessionTokenService>) -> Self {
        Self { accounts, tokens }
    }
}

/// JWT Bearer token authentication
#[derive(SecurityScheme)]
#[oai(
    ty = "bearer",
    key_name = "Authorization",
    key_in = "header",
    bearer_format = "JWT"
)]
pub struct BearerAuth(pub Bearer);

/// API tags for the staff endpoints
#[derive(Tags)]
enum StaffTags {
    /// Sign-in, sign-out, and password resets
    Session,
    /// Account management
    Users,
}

#[OpenApi(prefix_path = "/admin")]
impl StaffApi {
    /// Sign into a staff account and receive a session token carrying the
    /// resolved privilege snapshot
    #[oai(path = "/sign_in", method = "post", tag = "StaffTags::Session")]
    async fn sign_in(&self, body: Json<SignInRequest>) -> Result<SignInApiResponse, UserError> {
        match self.accounts.sign_in(&body.0).await? {
            SignInOutcome::SignedIn(response) => Ok(SignInApiResponse::Ok(Json(response))),
            SignInOutcome::FirstUserAvailable => {
                Ok(SignInApiResponse::FirstUser(Json(SignInRejection {
                    message: String::new(),
                    first_user: Some(true),
                })))
            }
        }
    }

    /// Sign out. Sessions are stateless tokens, so the server only
    /// acknowledges; the client discards its copy.
    #[oai(path = "/sign_out", method = "post", tag = "StaffTags::Session")]
    async fn sign_out(&self) -> Json<MessageResponse> {
        Json(MessageResponse::new("Signed out"))
    }

    /// Create a staff account. The new user receives a welcome email with
    /// a password reset link.
    #[oai(path = "/users", method = "post", tag = "StaffTags::Users")]
    async fn add_user(
        &self,
        auth: BearerAuth,
        body: Json<AddUserRequest>,
    ) -> Result<Json<MessageResponse>, UserError> {
        let claims = self.tokens.verify(&auth.0.token)?;
        self.accounts.add_user(Some(&claims), &body.0).await?;
        Ok(Json(MessageResponse::new("Added user successfully.")))
    }

    /// Create the first account. Only available while no account exists,
    /// and only with the configured bootstrap credentials.
    #[oai(path = "/users/first", method = "post", tag = "StaffTags::Users")]
    async fn add_first_user(
        &self,
        body: Json<AddUserRequest>,
    ) -> Result<Json<MessageResponse>, UserError> {
        self.accounts.add_user(None, &body.0).await?;
        Ok(Json(MessageResponse::new("Added user successfully.")))
    }

    /// Apply a partial update to an account
    #[oai(path = "/users/:id", method = "put", tag = "StaffTags::Users")]
    async fn edit_user(
        &self,
        auth: BearerAuth,
        id: Path<i32>,
        body: Json<EditUserRequest>,
    ) -> Result<Json<MessageResponse>, UserError> {
        let claims = self.tokens.verify(&auth.0.token)?;
        self.accounts.edit_user(&claims, id.0, &body.0).await?;
        Ok(Json(MessageResponse::new("User account was modified!")))
    }

    /// List every account with resolved role names and privileges
    #[oai(path = "/users", method = "get", tag = "StaffTags::Users")]
    async fn get_users(&self, auth: BearerAuth) -> Result<Json<UserListResponse>, UserError> {
        self.tokens.verify(&auth.0.token)?;
        let data = self.accounts.list_users().await?;
        Ok(Json(UserListResponse {
            message: "Got User list successfully.".to_string(),
            data,
        }))
    }

    /// The versioned change log of an account
    #[oai(path = "/users/:id/history", method = "get", tag = "StaffTags::Users")]
    async fn get_user_history(
        &self,
        auth: BearerAuth,
        id: Path<i32>,
    ) -> Result<Json<UserHistoryResponse>, UserError> {
        self.tokens.verify(&auth.0.token)?;
        let data = self.accounts.user_history(id.0).await?;
        Ok(Json(UserHistoryResponse {
            message: String::new(),
            data,
        }))
    }

    /// Email a password reset code to an active account
    #[oai(
        path = "/users/password/reset_request",
        method = "post",
        tag = "StaffTags::Session"
    )]
    async fn request_password_reset(
        &self,
        body: Json<PasswordResetRequest>,
    ) -> Result<Json<MessageResponse>, UserError> {
        self.accounts.request_password_reset(&body.0).await?;
        Ok(Json(MessageResponse::new(
            "Password reset request was successful.",
        )))
    }

    /// Consume a reset code and set a new password
    #[oai(
        path = "/users/password/reset",
        method = "post",
        tag = "StaffTags::Session"
    )]
    async fn reset_password(
        &self,
        body: Json<ResetPasswordRequest>,
    ) -> Result<Json<MessageResponse>, UserError> {
        self.accounts.reset_password(&body.0).await?;
        Ok(Json(MessageResponse::new("Password was reset successfully.")))
    }
}
