use std::sync::Arc;

use chrono::Duration;

use crate::auth::{AuthService, PasswordHasher, PinSource, ResetPins, TokenService};
use crate::clock::Clock;
use crate::config::Config;
use crate::email::PinDelivery;
use crate::store::{ResetStore, UserStore};

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub config: Config,
    pub auth: AuthService,
}

/// External collaborators the auth subsystem is wired to.
pub struct Collaborators {
    pub users: Arc<dyn UserStore>,
    pub resets: Arc<dyn ResetStore>,
    pub delivery: Arc<dyn PinDelivery>,
    pub pin_source: Arc<dyn PinSource>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(config: Config, deps: Collaborators) -> Result<SharedState, String> {
        let hasher = PasswordHasher::new(config.password)?;
        let ttl = Duration::try_minutes(config.token_ttl_minutes)
            .filter(|ttl| *ttl > Duration::zero())
            .ok_or_else(|| format!("Invalid token TTL: {} minutes", config.token_ttl_minutes))?;
        let tokens = TokenService::new(&config.jwt_secret, ttl, deps.clock.clone());
        let pins = ResetPins::new(deps.resets, deps.pin_source, deps.clock.clone());
        let auth = AuthService::new(deps.users, pins, hasher, tokens, deps.delivery, deps.clock);

        Ok(Arc::new(AppState { config, auth }))
    }
}
