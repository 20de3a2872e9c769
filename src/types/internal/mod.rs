// Internal (non-API, non-database) types
pub mod account;
pub mod auth;
pub mod roles;
