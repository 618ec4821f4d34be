use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;

pub type UserId = i64;

/// User record in the database.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: UserId,                 // caller-supplied, positive
    pub username: String,           // trimmed, unique
    #[serde(skip_serializing)]
    pub password_hash: String,      // Argon2 PHC string
    pub created_at: OffsetDateTime,
}

/// Row to insert at registration.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: UserId,
    pub username: String,
    pub password_hash: String,
}
