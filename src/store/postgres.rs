use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{ResetStore, StoreError, UserStore};
use crate::models::{NewResetRequest, NewUser, PasswordResetRequest, User};

const USER_COLUMNS: &str = "id, name, email, password_hash, role, created_at";
const RESET_COLUMNS: &str = "id, email, pin, created_at, expires_at";

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    password_hash: String,
    role: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = row.role.parse().map_err(StoreError::Unavailable)?;
        Ok(User {
            id: row.id,
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            role,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ResetRow {
    id: Uuid,
    email: String,
    pin: String,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl From<ResetRow> for PasswordResetRequest {
    fn from(row: ResetRow) -> Self {
        PasswordResetRequest {
            id: row.id,
            email: row.email,
            pin: row.pin,
            created_at: row.created_at,
            expires_at: row.expires_at,
        }
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?
        .map(User::try_from)
        .transpose()
    }

    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO users (name, email, password_hash, role, created_at)
             VALUES ($1, $2, $3, $4, $5) RETURNING {USER_COLUMNS}"
        ))
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.created_at)
        .fetch_one(&self.pool)
        .await?;
        User::try_from(row)
    }

    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> Result<(), StoreError> {
        sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ResetStore for PgStore {
    async fn insert(&self, request: NewResetRequest) -> Result<PasswordResetRequest, StoreError> {
        let row = sqlx::query_as::<_, ResetRow>(&format!(
            "INSERT INTO password_resets (email, pin, created_at, expires_at)
             VALUES ($1, $2, $3, $4) RETURNING {RESET_COLUMNS}"
        ))
        .bind(&request.email)
        .bind(&request.pin)
        .bind(request.created_at)
        .bind(request.expires_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn find_latest_by_email_and_pin(
        &self,
        email: &str,
        pin: &str,
    ) -> Result<Option<PasswordResetRequest>, StoreError> {
        let row = sqlx::query_as::<_, ResetRow>(&format!(
            "SELECT {RESET_COLUMNS} FROM password_resets
             WHERE email = $1 AND pin = $2
             ORDER BY created_at DESC, seq DESC
             LIMIT 1"
        ))
        .bind(email)
        .bind(pin)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn delete_all_by_email(&self, email: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM password_resets WHERE email = $1")
            .bind(email)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM password_resets WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
