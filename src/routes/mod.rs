pub mod auth;
pub mod system;

use axum::Router;
use axum::extract::FromRequest;
use axum::routing::{get, post};

use crate::error::AppError;
use crate::state::SharedState;

/// `Json` body extractor whose rejections render as `AppError::BadRequest`.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        // Auth
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/forgot-password", post(auth::forgot_password))
        .route("/auth/reset-password", post(auth::reset_password))
        .route("/auth/me", get(auth::me))
        // System
        .route("/system/health", get(system::health))
}
