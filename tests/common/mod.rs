use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};

use summit_reviews_server::config::settings::{Settings, SmtpSettings};
use summit_reviews_server::services::{AccountService, MailError, Mailer, SessionTokenService};
use summit_reviews_server::types::db::role;

pub const BOOTSTRAP_EMAIL: &str = "founder@summitreviews.net";
pub const BOOTSTRAP_PASSWORD: &str = "bootstrap-password";

/// Records messages instead of delivering them.
#[derive(Default)]
pub struct StubMailer {
    pub sent: Mutex<Vec<(String, String, String)>>,
}

impl StubMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bodies(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(_, _, body)| body.clone())
            .collect()
    }
}

#[async_trait]
impl Mailer for StubMailer {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), MailError> {
        self.sent.lock().unwrap().push((
            to.to_string(),
            subject.to_string(),
            html_body.to_string(),
        ));
        Ok(())
    }
}

pub fn test_settings() -> Settings {
    Settings {
        server_host: "127.0.0.1".to_string(),
        server_port: 3000,
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: "integration-test-secret-at-least-32-chars".to_string(),
        session_timeout_hours: 24,
        base_url: "http://localhost:3000/".to_string(),
        first_user_email: BOOTSTRAP_EMAIL.to_string(),
        first_user_password: BOOTSTRAP_PASSWORD.to_string(),
        smtp: SmtpSettings {
            host: "localhost".to_string(),
            port: 465,
            username: String::new(),
            password: String::new(),
            from: "noreply@summitreviews.net".to_string(),
        },
    }
}

pub struct TestApp {
    pub db: DatabaseConnection,
    pub accounts: Arc<AccountService>,
    pub tokens: Arc<SessionTokenService>,
    pub mailer: Arc<StubMailer>,
}

/// Fresh in-memory database with migrations applied, wired into the
/// account service.
pub async fn spawn_app() -> TestApp {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to create test database");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    let settings = Arc::new(test_settings());
    let tokens = Arc::new(SessionTokenService::new(
        settings.jwt_secret.clone(),
        settings.session_timeout_hours,
    ));
    let mailer = Arc::new(StubMailer::new());
    let accounts = Arc::new(AccountService::new(
        db.clone(),
        tokens.clone(),
        mailer.clone(),
        settings,
    ));

    TestApp {
        db,
        accounts,
        tokens,
        mailer,
    }
}

pub async fn seed_role(db: &DatabaseConnection, id: i32, name: &str, privileges: &str) {
    role::ActiveModel {
        id: Set(id),
        name: Set(name.to_string()),
        privileges: Set(privileges.to_string()),
    }
    .insert(db)
    .await
    .expect("Failed to seed role");
}
