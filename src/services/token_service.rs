use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::fmt;

use crate::errors::UserError;
use crate::types::internal::auth::Claims;

/// Issues and verifies session tokens.
///
/// Tokens carry the identity and the privilege snapshot resolved at
/// sign-in. Verification distinguishes a malformed token from an expired
/// session; both surface as HTTP 440 upstream.
pub struct SessionTokenService {
    jwt_secret: String,
    session_timeout_hours: i64,
}

impl SessionTokenService {
    /// Create a new SessionTokenService with the given signing secret and
    /// session lifetime in hours
    pub fn new(jwt_secret: String, session_timeout_hours: i64) -> Self {
        Self {
            jwt_secret,
            session_timeout_hours,
        }
    }

    /// Sign a session token for the given identity and resolved privileges
    pub fn issue(
        &self,
        id: i32,
        email: &str,
        name: &str,
        privileges: Vec<i32>,
    ) -> Result<String, UserError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            id,
            email: email.to_string(),
            name: name.to_string(),
            privileges,
            iat: now,
            exp: now + self.session_timeout_hours * 60 * 60,
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| UserError::internal_error(format!("Failed to sign session token: {}", e)))
    }

    /// Verify a session token and return its claims
    pub fn verify(&self, token: &str) -> Result<Claims, UserError> {
        let validation = Validation::new(Algorithm::HS256);

        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => UserError::session_expired(),
            _ => UserError::invalid_session(),
        })?;

        Ok(token_data.claims)
    }
}

impl fmt::Debug for SessionTokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionTokenService")
            .field("jwt_secret", &"<redacted>")
            .field("session_timeout_hours", &self.session_timeout_hours)
            .finish()
    }
}

impl fmt::Display for SessionTokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SessionTokenService {{ session_timeout: {}h }}",
            self.session_timeout_hours
        )
    }
}
