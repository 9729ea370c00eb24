use std::sync::Arc;

use chrono::Duration;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::AuthError;
use crate::models::Role;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: Uuid,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and verifies HS256 bearer tokens with a secret fixed at construction.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    default_ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl TokenService {
    pub fn new(secret: &str, default_ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        // Expiry is checked against the injected clock in `verify`, with no leeway.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            default_ttl,
            clock,
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub fn issue(&self, user_id: Uuid, role: Role, ttl: Duration) -> Result<String, String> {
        let now = self.clock.now();
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or_else(|| format!("Token lifetime out of range: {ttl}"))?;
        let claims = Claims {
            sub: user_id,
            role,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| format!("JWT encode failed: {e}"))
    }

    /// Issue a token with the configured default lifetime.
    pub fn issue_default(&self, user_id: Uuid, role: Role) -> Result<String, String> {
        self.issue(user_id, role, self.default_ttl)
    }

    /// Every failure collapses into `AuthError::InvalidToken`.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let claims = decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("JWT decode failed: {e}");
                AuthError::InvalidToken
            })?;

        if claims.exp <= self.clock.now().timestamp() {
            tracing::debug!(user_id = %claims.sub, "JWT expired");
            return Err(AuthError::InvalidToken);
        }

        Ok(claims)
    }
}
