use std::env;
use std::fmt;

/// SMTP transport configuration for outbound mail
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Sender address placed in the From header
    pub from: String,
}

/// Process-wide settings, loaded once at startup and passed by reference
/// into the services that need them.
#[derive(Clone)]
pub struct Settings {
    pub server_host: String,
    pub server_port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    /// Session token lifetime in hours
    pub session_timeout_hours: i64,
    /// Public base URL used to build links in outbound mail
    pub base_url: String,
    /// Credentials that unlock the first-user bootstrap flow
    pub first_user_email: String,
    pub first_user_password: String,
    pub smtp: SmtpSettings,
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Missing required environment variable: {0}")]
    MissingVariable(String),

    #[error("Invalid value for {name}: {reason}")]
    InvalidValue { name: String, reason: String },
}

impl Settings {
    /// Load settings from environment variables.
    ///
    /// `JWT_SECRET` is the only variable without a default; everything else
    /// falls back to a development-friendly value.
    pub fn from_env() -> Result<Self, SettingsError> {
        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| SettingsError::MissingVariable("JWT_SECRET".to_string()))?;

        let server_host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let server_port = parse_var("PORT", 3000)?;

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://summit.db?mode=rwc".to_string());

        let session_timeout_hours = parse_var("SESSION_TIMEOUT_HOURS", 24)?;

        let base_url = env::var("BASE_URL").unwrap_or_else(|_| "http://localhost:3000/".to_string());

        let first_user_email = env::var("FIRST_USER_EMAIL").unwrap_or_else(|_| "pending".to_string());
        let first_user_password =
            env::var("FIRST_USER_PASSWORD").unwrap_or_else(|_| "pending".to_string());

        let smtp = SmtpSettings {
            host: env::var("SMTP_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: parse_var("SMTP_PORT", 465)?,
            username: env::var("SMTP_USERNAME").unwrap_or_default(),
            password: env::var("SMTP_PASSWORD").unwrap_or_default(),
            from: env::var("SMTP_FROM").unwrap_or_else(|_| "noreply@summitreviews.net".to_string()),
        };

        Ok(Self {
            server_host,
            server_port,
            database_url,
            jwt_secret,
            session_timeout_hours,
            base_url,
            first_user_email,
            first_user_password,
            smtp,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T, SettingsError>
where
    T::Err: fmt::Display,
{
    match env::var(name) {
        Ok(value) => value.parse().map_err(|e: T::Err| SettingsError::InvalidValue {
            name: name.to_string(),
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("server_host", &self.server_host)
            .field("server_port", &self.server_port)
            .field("database_url", &self.database_url)
            .field("jwt_secret", &"<redacted>")
            .field("session_timeout_hours", &self.session_timeout_hours)
            .field("base_url", &self.base_url)
            .field("first_user_email", &self.first_user_email)
            .field("first_user_password", &"<redacted>")
            .finish()
    }
}
