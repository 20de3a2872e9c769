mod api;
mod config;
mod errors;
mod services;
mod stores;
mod types;

use std::sync::Arc;

use migration::{Migrator, MigratorTrait};
use poem::{listener::TcpListener, Route, Server};
use poem_openapi::OpenApiService;
use sea_orm::{Database, DatabaseConnection};

use api::{HealthApi, StaffApi};
use config::{init_logging, Settings};
use services::{AccountService, SessionTokenService, SmtpMailer};

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    init_logging().expect("Failed to initialize logging");

    let settings = Arc::new(Settings::from_env().expect("Failed to load settings"));

    // Connect to database
    let db: DatabaseConnection = Database::connect(&settings.database_url)
        .await
        .expect("Failed to connect to database");

    tracing::info!(database_url = %settings.database_url, "Connected to database");

    // Run migrations
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    tracing::info!("Database migrations completed");

    let tokens = Arc::new(SessionTokenService::new(
        settings.jwt_secret.clone(),
        settings.session_timeout_hours,
    ));

    let mailer = Arc::new(
        SmtpMailer::from_settings(&settings.smtp).expect("Failed to build mail transport"),
    );

    let accounts = Arc::new(AccountService::new(
        db,
        tokens.clone(),
        mailer,
        settings.clone(),
    ));

    let staff_api = StaffApi::new(accounts, tokens);

    // Create OpenAPI service with API implementation
    let api_service = OpenApiService::new(
        (HealthApi, staff_api),
        "Summit Reviews Staff API",
        "1.0.0",
    )
    .server(format!("http://localhost:{}", settings.server_port));

    // Generate Swagger UI from OpenAPI service
    let ui = api_service.swagger_ui();

    // Compose routes: API at the root, Swagger UI under /swagger
    let app = Route::new().nest("/", api_service).nest("/swagger", ui);

    let address = settings.server_address();
    tracing::info!(%address, "Starting server");

    Server::new(TcpListener::bind(address)).run(app).await
}
