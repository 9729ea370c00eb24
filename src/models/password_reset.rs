use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordResetRequest {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub pin: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl PasswordResetRequest {
    /// A request stops being usable at the instant it reaches `expires_at`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[derive(Debug, Clone)]
pub struct NewResetRequest {
    pub email: String,
    pub pin: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}
