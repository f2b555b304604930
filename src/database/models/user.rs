use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    /// Argon2 PHC string, never serialized.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    /// Stored reference (URL or media path) to the profile picture.
    pub avatar: Option<String>,
    pub is_active: bool,
    pub is_staff: bool,
    pub date_joined: DateTime<Utc>,
}
