use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

pub mod memory;
pub mod postgres;

pub use memory::MemoryUserStore;
pub use postgres::PgUserStore;

/// User record as stored; usernames are case-sensitive and unique, emails
/// are stored lowercase and unique.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,                   // unique user ID
    pub username: String,           // login name, immutable after registration
    pub email: String,              // user email, lowercase
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,      // Argon2 hash, not exposed in JSON
    pub created_at: OffsetDateTime, // creation timestamp
}

/// Fields for a user about to be created. Carries the hash, never the
/// plaintext password.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("username already taken")]
    DuplicateUsername,

    #[error("email already registered")]
    DuplicateEmail,

    #[error("user not found")]
    NotFound,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Credential store behind the auth service. Implementations enforce
/// username and email uniqueness; `insert` reports the username conflict
/// before the email conflict when both apply.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    async fn insert(&self, new_user: NewUser) -> Result<User, StoreError>;

    /// Overwrite the stored record for `user.id`. The username is not
    /// updatable; implementations only persist the mutable columns.
    async fn update(&self, user: &User) -> Result<(), StoreError>;

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<User>, StoreError>;

    async fn delete(&self, id: Uuid) -> Result<(), StoreError>;
}
