//! Bank customer model. Read-only reference data.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Represents a user record from the `users` table.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,

    /// Unique across users
    pub email: String,

    pub phone_number: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
