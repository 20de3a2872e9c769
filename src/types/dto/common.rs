use poem_openapi::Object;
use serde::{Deserialize, Serialize};

/// Response model for health check endpoint
#[derive(Object, Debug)]
pub struct HealthResponse {
    /// Status of the service
    pub status: String,

    /// Timestamp of the health check (ISO 8601 format)
    pub timestamp: String,
}

/// Simple acknowledgement body used by the mutating endpoints
#[derive(Object, Debug)]
pub struct MessageResponse {
    /// Human-readable outcome message
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A column descriptor for table-shaped responses consumed by the staff UI
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct TableColumn {
    /// Row field the column reads from
    pub field: String,

    /// Column header shown to the user
    pub title: String,
}

impl TableColumn {
    pub fn new(field: &str, title: &str) -> Self {
        Self {
            field: field.to_string(),
            title: title.to_string(),
        }
    }
}
