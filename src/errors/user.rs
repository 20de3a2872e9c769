use poem_openapi::{payload::Json, ApiResponse, Object};
use std::fmt;

// Message stubs shared across the validators so outputs stay uniform.
pub const ERR_DB_CONNECT: &str = "Failed to connect to the database: ";
pub const ERR_EXCEEDED_STRING_LENGTH: &str = "Field exceeded string length: ";
pub const ERR_MISSING_PARAMETER: &str = "Missing parameter: ";
pub const ERR_NO_ADMINS: &str = "Action rejected, as it would remove the last active admin.";
pub const ERR_NOT_AUTHORIZED: &str = "Not Authorized: ";
pub const ERR_INVALID_PARAMETER: &str = "Invalid parameter: ";
pub const ERR_INVALID_ACTION: &str = "Invalid action: ";

/// Standardized error response for the staff endpoints
#[derive(Object, Debug)]
pub struct UserErrorResponse {
    /// Error code identifier
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// HTTP status code
    pub status_code: u16,
}

/// Errors produced by the staff user endpoints
#[derive(ApiResponse, Debug)]
pub enum UserError {
    /// Missing, oversized, or malformed input; caller-correctable
    #[oai(status = 400)]
    ValidationFailed(Json<UserErrorResponse>),

    /// Caller lacks the privilege the operation requires
    #[oai(status = 401)]
    NotAuthorized(Json<UserErrorResponse>),

    /// Rejected outright: bad credentials, inactive account, or a change
    /// that would remove the last active admin
    #[oai(status = 403)]
    Forbidden(Json<UserErrorResponse>),

    /// First-user bootstrap attempted while accounts already exist
    #[oai(status = 405)]
    NotAllowed(Json<UserErrorResponse>),

    /// Bearer token is not a valid session token
    #[oai(status = 440)]
    InvalidSession(Json<UserErrorResponse>),

    /// Session token was valid but has expired
    #[oai(status = 440)]
    SessionExpired(Json<UserErrorResponse>),

    /// Storage, email, or other infrastructure failure
    #[oai(status = 500)]
    InternalError(Json<UserErrorResponse>),
}

impl UserError {
    fn body(error: &str, message: String, status_code: u16) -> Json<UserErrorResponse> {
        Json(UserErrorResponse {
            error: error.to_string(),
            message,
            status_code,
        })
    }

    /// Create a missing-parameter validation error
    pub fn missing_parameter(detail: &str) -> Self {
        UserError::ValidationFailed(Self::body(
            "missing_parameter",
            format!("{ERR_MISSING_PARAMETER}{detail}"),
            400,
        ))
    }

    /// Create a string-length validation error
    pub fn exceeded_length(detail: &str) -> Self {
        UserError::ValidationFailed(Self::body(
            "exceeded_string_length",
            format!("{ERR_EXCEEDED_STRING_LENGTH}{detail}"),
            400,
        ))
    }

    /// Create an invalid-parameter validation error
    pub fn invalid_parameter(detail: &str) -> Self {
        UserError::ValidationFailed(Self::body(
            "invalid_parameter",
            format!("{ERR_INVALID_PARAMETER}{detail}"),
            400,
        ))
    }

    /// Create a duplicate-email validation error
    pub fn duplicate_email(email: &str) -> Self {
        UserError::ValidationFailed(Self::body(
            "duplicate_email",
            format!("A user with the following email address already exists: {email}."),
            400,
        ))
    }

    /// Create a generic 400 validation error with a literal message
    pub fn validation(message: impl Into<String>) -> Self {
        UserError::ValidationFailed(Self::body("validation_failed", message.into(), 400))
    }

    /// Create a not-authorized error
    pub fn not_authorized(detail: &str) -> Self {
        UserError::NotAuthorized(Self::body(
            "not_authorized",
            format!("{ERR_NOT_AUTHORIZED}{detail}"),
            401,
        ))
    }

    /// Create the dedicated last-active-admin rejection
    pub fn no_admins() -> Self {
        UserError::Forbidden(Self::body("no_admins", ERR_NO_ADMINS.to_string(), 403))
    }

    /// Create a generic 403 rejection
    pub fn forbidden(message: impl Into<String>) -> Self {
        UserError::Forbidden(Self::body("forbidden", message.into(), 403))
    }

    /// Create an invalid-action error (bootstrap with existing users)
    pub fn invalid_action(detail: &str) -> Self {
        UserError::NotAllowed(Self::body(
            "invalid_action",
            format!("{ERR_INVALID_ACTION}{detail}"),
            405,
        ))
    }

    /// Create an invalid-session error
    pub fn invalid_session() -> Self {
        UserError::InvalidSession(Self::body("invalid_token", "Invalid token.".to_string(), 440))
    }

    /// Create an expired-session error
    pub fn session_expired() -> Self {
        UserError::SessionExpired(Self::body(
            "session_expired",
            "Session timed out.".to_string(),
            440,
        ))
    }

    /// Create an internal error with a sanitized message
    pub fn internal_error(message: impl Into<String>) -> Self {
        UserError::InternalError(Self::body("internal_error", message.into(), 500))
    }

    /// Get the error message from the error variant
    pub fn message(&self) -> String {
        match self {
            UserError::ValidationFailed(json) => json.0.message.clone(),
            UserError::NotAuthorized(json) => json.0.message.clone(),
            UserError::Forbidden(json) => json.0.message.clone(),
            UserError::NotAllowed(json) => json.0.message.clone(),
            UserError::InvalidSession(json) => json.0.message.clone(),
            UserError::SessionExpired(json) => json.0.message.clone(),
            UserError::InternalError(json) => json.0.message.clone(),
        }
    }

    /// Get the HTTP status code of the error variant
    pub fn status_code(&self) -> u16 {
        match self {
            UserError::ValidationFailed(json) => json.0.status_code,
            UserError::NotAuthorized(json) => json.0.status_code,
            UserError::Forbidden(json) => json.0.status_code,
            UserError::NotAllowed(json) => json.0.status_code,
            UserError::InvalidSession(json) => json.0.status_code,
            UserError::SessionExpired(json) => json.0.status_code,
            UserError::InternalError(json) => json.0.status_code,
        }
    }
}

impl fmt::Display for UserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}
