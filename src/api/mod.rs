// API layer - HTTP endpoints
pub mod health;
pub mod user;

pub use health::HealthApi;
pub use user::{BearerAuth, StaffApi};
