pub mod memory;
pub mod postgres;

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{NewResetRequest, NewUser, PasswordResetRequest, User};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    Conflict,
    Unavailable(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Conflict => write!(f, "Unique constraint violated"),
            StoreError::Unavailable(msg) => write!(f, "Store unavailable: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err.as_database_error() {
            Some(db_err) if db_err.is_unique_violation() => StoreError::Conflict,
            _ => StoreError::Unavailable(err.to_string()),
        }
    }
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Persist a new user. Fails with `Conflict` if the email is already taken.
    async fn insert(&self, user: NewUser) -> Result<User, StoreError>;

    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> Result<(), StoreError>;
}

#[async_trait]
pub trait ResetStore: Send + Sync {
    async fn insert(&self, request: NewResetRequest) -> Result<PasswordResetRequest, StoreError>;

    /// Most recently created request for the pair, expired or not.
    async fn find_latest_by_email_and_pin(
        &self,
        email: &str,
        pin: &str,
    ) -> Result<Option<PasswordResetRequest>, StoreError>;

    async fn delete_all_by_email(&self, email: &str) -> Result<(), StoreError>;

    /// Remove every request whose `expires_at` is at or before `now`. Returns the count removed.
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;
}
