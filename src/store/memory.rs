use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use uuid::Uuid;

use super::{ResetStore, StoreError, UserStore};
use crate::models::{NewResetRequest, NewUser, PasswordResetRequest, User};

/// Process-local store used when no database is configured and in tests.
#[derive(Default)]
pub struct MemoryStore {
    /// email -> user
    users: DashMap<String, User>,
    /// email -> reset requests in insertion order
    resets: DashMap<String, Vec<PasswordResetRequest>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn reset_count(&self, email: &str) -> usize {
        self.resets.get(email).map(|list| list.len()).unwrap_or(0)
    }

    /// Pending requests for an email, oldest first.
    pub fn resets_for(&self, email: &str) -> Vec<PasswordResetRequest> {
        self.resets
            .get(email)
            .map(|list| list.clone())
            .unwrap_or_default()
    }

    /// Drop a user record, simulating an account removed by another system.
    pub fn remove_user(&self, email: &str) -> Option<User> {
        self.users.remove(email).map(|(_, user)| user)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.get(email).map(|u| u.clone()))
    }

    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        match self.users.entry(user.email.clone()) {
            Entry::Occupied(_) => Err(StoreError::Conflict),
            Entry::Vacant(slot) => {
                let stored = User {
                    id: Uuid::now_v7(),
                    name: user.name,
                    email: user.email,
                    password_hash: user.password_hash,
                    role: user.role,
                    created_at: user.created_at,
                };
                slot.insert(stored.clone());
                Ok(stored)
            }
        }
    }

    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> Result<(), StoreError> {
        if let Some(mut user) = self.users.iter_mut().find(|u| u.id == id) {
            user.password_hash = password_hash.to_string();
        }
        Ok(())
    }
}

#[async_trait]
impl ResetStore for MemoryStore {
    async fn insert(&self, request: NewResetRequest) -> Result<PasswordResetRequest, StoreError> {
        let stored = PasswordResetRequest {
            id: Uuid::now_v7(),
            email: request.email,
            pin: request.pin,
            created_at: request.created_at,
            expires_at: request.expires_at,
        };
        self.resets
            .entry(stored.email.clone())
            .or_default()
            .push(stored.clone());
        Ok(stored)
    }

    async fn find_latest_by_email_and_pin(
        &self,
        email: &str,
        pin: &str,
    ) -> Result<Option<PasswordResetRequest>, StoreError> {
        let Some(list) = self.resets.get(email) else {
            return Ok(None);
        };

        // max_by_key keeps the last maximum, so equal timestamps resolve to the newest insert
        Ok(list
            .iter()
            .filter(|r| r.pin == pin)
            .max_by_key(|r| r.created_at)
            .cloned())
    }

    async fn delete_all_by_email(&self, email: &str) -> Result<(), StoreError> {
        self.resets.remove(email);
        Ok(())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut removed = 0u64;
        self.resets.retain(|_, list| {
            let before = list.len();
            list.retain(|r| !r.is_expired(now));
            removed += (before - list.len()) as u64;
            !list.is_empty()
        });
        Ok(removed)
    }
}
