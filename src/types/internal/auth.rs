use serde::{Deserialize, Serialize};

/// Session token claims.
///
/// The privilege list is the snapshot resolved at sign-in time; it is not
/// re-resolved on later requests for the lifetime of the token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub id: i32,

    /// Account email
    pub email: String,

    /// Display name (the account username)
    pub name: String,

    /// Resolved privilege ids, deduplicated and ascending
    pub privileges: Vec<i32>,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    pub fn has_privilege(&self, privilege: i32) -> bool {
        self.privileges.contains(&privilege)
    }
}
