use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::auth::jwt::TokenService;
use crate::error::{AppError, AuthError};
use crate::models::Role;
use crate::state::SharedState;

/// Identity of the caller, decoded from a verified bearer token. Lives for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Split an `Authorization` value into scheme and token.
///
/// The value must be exactly two parts separated by a single space, and the
/// scheme must be `Bearer` in any letter case.
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header.ok_or(AuthError::MissingToken)?;

    let parts: Vec<&str> = header.split(' ').collect();
    let [scheme, token] = parts.as_slice() else {
        return Err(AuthError::MalformedHeader);
    };

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::MalformedScheme);
    }

    Ok(*token)
}

/// Gate a request on its `Authorization` header. Consults only the token service.
pub fn authenticate(headers: &HeaderMap, tokens: &TokenService) -> Result<AuthUser, AuthError> {
    let header = match headers.get(AUTHORIZATION) {
        None => None,
        Some(value) => Some(value.to_str().map_err(|_| AuthError::MalformedHeader)?),
    };

    let token = bearer_token(header)?;
    let claims = tokens.verify(token)?;

    Ok(AuthUser {
        user_id: claims.sub,
        role: claims.role,
    })
}

impl FromRequestParts<SharedState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        authenticate(&parts.headers, state.auth.tokens()).map_err(|e| {
            tracing::debug!(reason = %e, "Request rejected by authenticator");
            AppError::from(e)
        })
    }
}
