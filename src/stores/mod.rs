// Storage layer - sea-orm queries grouped by table
pub mod reset_store;
pub mod role_store;
pub mod user_store;

pub use reset_store::ResetStore;
pub use role_store::RoleStore;
pub use user_store::UserStore;
