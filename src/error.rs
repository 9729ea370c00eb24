use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::store::StoreError;

/// Outcome of a failed auth workflow step or authenticator check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    DuplicateEmail,
    /// Unknown email and wrong password both map here.
    InvalidCredentials,
    InvalidResetCode,
    ExpiredResetCode,
    UserNotFound,
    MissingToken,
    MalformedHeader,
    MalformedScheme,
    InvalidToken,
    StoreUnavailable(String),
    Internal(String),
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::DuplicateEmail => write!(f, "This email is already registered"),
            AuthError::InvalidCredentials => write!(f, "Invalid email or password"),
            AuthError::InvalidResetCode => write!(f, "Invalid reset code"),
            AuthError::ExpiredResetCode => write!(f, "Reset code has expired"),
            AuthError::UserNotFound => write!(f, "User not found"),
            AuthError::MissingToken => write!(f, "Missing authentication token"),
            AuthError::MalformedHeader => write!(f, "Invalid authorization header format"),
            AuthError::MalformedScheme => write!(f, "Malformed authorization scheme"),
            AuthError::InvalidToken => write!(f, "Invalid or expired token"),
            AuthError::StoreUnavailable(msg) => write!(f, "Store unavailable: {msg}"),
            AuthError::Internal(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict => {
                AuthError::StoreUnavailable("unexpected unique constraint violation".to_string())
            }
            StoreError::Unavailable(msg) => AuthError::StoreUnavailable(msg),
        }
    }
}

#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    Unauthorized(String),
    BadRequest(String),
    Internal(String),
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::NotFound(msg) => write!(f, "Not Found: {msg}"),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {msg}"),
            AppError::BadRequest(msg) => write!(f, "Bad Request: {msg}"),
            AppError::Internal(msg) => write!(f, "Internal Error: {msg}"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::DuplicateEmail
            | AuthError::InvalidResetCode
            | AuthError::ExpiredResetCode => AppError::BadRequest(err.to_string()),
            AuthError::InvalidCredentials
            | AuthError::MissingToken
            | AuthError::MalformedHeader
            | AuthError::MalformedScheme
            | AuthError::InvalidToken => AppError::Unauthorized(err.to_string()),
            AuthError::UserNotFound => AppError::NotFound(err.to_string()),
            AuthError::StoreUnavailable(_) | AuthError::Internal(_) => {
                AppError::Internal(err.to_string())
            }
        }
    }
}
