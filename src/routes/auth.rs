use std::sync::LazyLock;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::auth::{AuthUser, RegisterInput, UserSummary};
use crate::error::AppError;
use crate::models::Role;
use crate::routes::JsonBody;
use crate::state::SharedState;

const MIN_PASSWORD_LEN: usize = 6;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

static PIN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]{6}$").unwrap());

#[derive(Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Option<Role>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    pub email: String,
    pub pin: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct RegisterResponse {
    pub success: bool,
    pub message: String,
    pub user: UserSummary,
    pub token: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub user: UserSummary,
    pub token: String,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Serialize)]
pub struct MeResponse {
    pub user_id: uuid::Uuid,
    pub role: Role,
}

fn normalize_email(email: &str) -> Result<String, AppError> {
    let email = email.trim().to_lowercase();
    if !EMAIL_RE.is_match(&email) {
        return Err(AppError::BadRequest("Invalid email address".to_string()));
    }
    Ok(email)
}

fn check_password(password: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

pub async fn register(
    State(state): State<SharedState>,
    JsonBody(req): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    let email = normalize_email(&req.email)?;
    check_password(&req.password)?;

    let outcome = state
        .auth
        .register(RegisterInput {
            name: req.name.trim().to_string(),
            email,
            password: req.password,
            role: req.role,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            success: true,
            message: "User created successfully".to_string(),
            user: outcome.user,
            token: outcome.token,
        }),
    ))
}

pub async fn login(
    State(state): State<SharedState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let email = normalize_email(&req.email)?;
    if req.password.is_empty() {
        return Err(AppError::BadRequest("Password is required".to_string()));
    }

    let outcome = state.auth.login(&email, &req.password).await?;

    Ok(Json(LoginResponse {
        success: true,
        user: outcome.user,
        token: outcome.token,
    }))
}

pub async fn forgot_password(
    State(state): State<SharedState>,
    JsonBody(req): JsonBody<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let email = normalize_email(&req.email)?;

    state.auth.request_reset(&email).await?;

    // Same body whether or not the email has an account
    Ok(Json(MessageResponse {
        success: true,
        message: "If that email is registered, a reset code has been sent.".to_string(),
    }))
}

pub async fn reset_password(
    State(state): State<SharedState>,
    JsonBody(req): JsonBody<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let email = normalize_email(&req.email)?;
    let pin = req.pin.trim();
    if !PIN_RE.is_match(pin) {
        return Err(AppError::BadRequest("Reset code must be 6 digits".to_string()));
    }
    check_password(&req.password)?;

    state
        .auth
        .complete_reset(&email, pin, &req.password)
        .await?;

    Ok(Json(MessageResponse {
        success: true,
        message: "Password reset successfully".to_string(),
    }))
}

pub async fn me(auth: AuthUser) -> Json<MeResponse> {
    Json(MeResponse {
        user_id: auth.user_id,
        role: auth.role,
    })
}
