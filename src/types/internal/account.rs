use std::fmt;

/// Account status. Accounts are never hard-deleted; deactivation is the
/// supported removal path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserStatus {
    Active,
    Inactive,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => "active",
            UserStatus::Inactive => "inactive",
        }
    }

    /// Parse a status string. Anything other than the two recognized
    /// values is rejected.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(UserStatus::Active),
            "inactive" => Some(UserStatus::Inactive),
            _ => None,
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Actions recorded in the account history. Closed set; history rows never
/// carry free-form action text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAction {
    Add,
    Edit,
    ResetPassword,
}

impl UserAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserAction::Add => "Add",
            UserAction::Edit => "Edit",
            UserAction::ResetPassword => "Reset Password",
        }
    }
}

impl fmt::Display for UserAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
