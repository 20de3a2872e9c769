// Service layer - business logic over the stores
pub mod account_service;
pub mod authorization;
pub mod crypto;
pub mod mailer;
pub mod role_resolver;
pub mod token_service;
pub mod validation;

pub use account_service::{AccountService, SignInOutcome};
pub use mailer::{MailError, Mailer, SmtpMailer};
pub use role_resolver::RoleResolver;
pub use token_service::SessionTokenService;
