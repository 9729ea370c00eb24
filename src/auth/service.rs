use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::auth::jwt::TokenService;
use crate::auth::password::PasswordHasher;
use crate::auth::pin::ResetPins;
use crate::clock::Clock;
use crate::email::PinDelivery;
use crate::error::AuthError;
use crate::models::{NewUser, Role, User};
use crate::store::{StoreError, UserStore};

#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Option<Role>,
}

/// Public part of a user returned alongside a token.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuthSuccess {
    pub user: UserSummary,
    pub token: String,
}

/// Register, login and the two-step PIN password reset.
///
/// Each operation is independent; no state is carried between calls other than
/// what the stores hold. Store failures surface as `AuthError::StoreUnavailable`
/// and are never retried here.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    pins: ResetPins,
    hasher: PasswordHasher,
    tokens: TokenService,
    delivery: Arc<dyn PinDelivery>,
    clock: Arc<dyn Clock>,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        pins: ResetPins,
        hasher: PasswordHasher,
        tokens: TokenService,
        delivery: Arc<dyn PinDelivery>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            pins,
            hasher,
            tokens,
            delivery,
            clock,
        }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    pub fn pins(&self) -> &ResetPins {
        &self.pins
    }

    pub async fn register(&self, input: RegisterInput) -> Result<AuthSuccess, AuthError> {
        if self.users.find_by_email(&input.email).await?.is_some() {
            tracing::warn!("Registration rejected: email already registered");
            return Err(AuthError::DuplicateEmail);
        }

        let password_hash = self.hash_password(input.password).await?;

        // The store's own uniqueness check closes the race left by the lookup above.
        let user = match self
            .users
            .insert(NewUser {
                name: input.name,
                email: input.email,
                password_hash,
                role: input.role.unwrap_or_default(),
                created_at: self.clock.now(),
            })
            .await
        {
            Ok(user) => user,
            Err(StoreError::Conflict) => {
                tracing::warn!("Registration lost a race on a duplicate email");
                return Err(AuthError::DuplicateEmail);
            }
            Err(e) => return Err(e.into()),
        };

        let token = self.issue_token(&user)?;
        tracing::info!(user_id = %user.id, role = %user.role, "user registered");

        Ok(AuthSuccess {
            user: UserSummary::from(&user),
            token,
        })
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSuccess, AuthError> {
        let Some(user) = self.users.find_by_email(email).await? else {
            // Burn the same Argon2 work as a wrong password so timing matches.
            let decoy = self.hasher.decoy_hash().to_string();
            self.verify_password(password.to_string(), decoy).await?;
            tracing::debug!("Login failed: unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        if !self
            .verify_password(password.to_string(), user.password_hash.clone())
            .await?
        {
            tracing::debug!(user_id = %user.id, "Login failed: wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.issue_token(&user)?;
        tracing::info!(user_id = %user.id, "user logged in");

        Ok(AuthSuccess {
            user: UserSummary::from(&user),
            token,
        })
    }

    /// Always succeeds for a reachable store, whether or not the email has an account.
    pub async fn request_reset(&self, email: &str) -> Result<(), AuthError> {
        let Some(user) = self.users.find_by_email(email).await? else {
            tracing::debug!("Password reset requested for unknown email");
            return Ok(());
        };

        let request = self.pins.create_request(&user.email).await?;
        tracing::info!(user_id = %user.id, "password reset requested");

        // Delivery runs detached so response timing does not depend on the account existing
        let delivery = self.delivery.clone();
        let to = user.email;
        let pin = request.pin;
        tokio::spawn(async move {
            if let Err(e) = delivery.deliver(&to, &pin).await {
                tracing::error!("Failed to deliver password reset code: {e}");
            }
        });

        Ok(())
    }

    pub async fn complete_reset(
        &self,
        email: &str,
        pin: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let request = self
            .pins
            .find_valid(email, pin)
            .await?
            .ok_or(AuthError::InvalidResetCode)?;

        if request.is_expired(self.clock.now()) {
            tracing::debug!(request_id = %request.id, "Reset code expired");
            return Err(AuthError::ExpiredResetCode);
        }

        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let password_hash = self.hash_password(new_password.to_string()).await?;
        self.users
            .update_password_hash(user.id, &password_hash)
            .await?;

        if let Err(e) = self.pins.consume_all(email).await {
            // Password already changed; outstanding PINs for this email remain usable.
            tracing::warn!(user_id = %user.id, "Password reset applied but reset codes not consumed: {e}");
            return Err(e.into());
        }
        tracing::info!(user_id = %user.id, "password reset completed");

        Ok(())
    }

    fn issue_token(&self, user: &User) -> Result<String, AuthError> {
        self.tokens
            .issue_default(user.id, user.role)
            .map_err(AuthError::Internal)
    }

    // Argon2 is CPU bound; keep it off the async workers.
    async fn hash_password(&self, password: String) -> Result<String, AuthError> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AuthError::Internal(format!("Hashing task failed: {e}")))?
            .map_err(AuthError::Internal)
    }

    async fn verify_password(&self, password: String, hash: String) -> Result<bool, AuthError> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| AuthError::Internal(format!("Verify task failed: {e}")))?
            .map_err(AuthError::Internal)
    }
}
