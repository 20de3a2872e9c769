// Error types for the HTTP surface
pub mod user;

pub use user::{UserError, UserErrorResponse};
