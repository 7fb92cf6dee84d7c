//! Authentication endpoints: signup, login, verification, password reset.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use chrono::{Duration, Utc};
use serde::Deserialize;
use tracing::{info, warn};

use hearth_core::defaults::{RESET_CODE_TTL_SECS, SESSION_TTL_SECS};
use hearth_core::{
    CreateUserRequest, JobType, LoginRequest, Role, SessionRepository, UserRepository,
};
use hearth_db::JobRepository;
use hearth_db::{hash_password, validate_password, verify_password};
use hearth_jobs::generate_code;

use crate::auth::{bearer_token, require_user};
use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub username: String,
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct RequestResetRequest {
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub username: String,
    pub code: String,
    pub new_password: String,
}

/// POST /api/auth/register
///
/// New accounts start at guest tier; an admin promotes them to member
/// after the email is verified.
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_password(&req.password).map_err(ApiError::BadRequest)?;
    let password_hash = hash_password(&req.password)?;

    let user_id = state
        .db
        .users
        .create(&req.username, &req.email, &password_hash, Role::Guest)
        .await?;

    let code = generate_code();
    let expires_at = Utc::now() + Duration::seconds(RESET_CODE_TTL_SECS);
    state
        .db
        .users
        .set_pending_code(user_id, &code, expires_at)
        .await?;

    let payload = serde_json::json!({
        "email": req.email,
        "username": req.username,
        "code": code,
    });
    state
        .db
        .jobs
        .queue(JobType::VerificationEmail, Some(payload))
        .await?;

    info!(
        subsystem = "api",
        op = "register",
        user_id = %user_id,
        "Account created"
    );
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "id": user_id })),
    ))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if let Some(limiter) = &state.login_limiter {
        if limiter.check().is_err() {
            return Err(ApiError::TooManyRequests(
                "Too many login attempts, try again shortly".to_string(),
            ));
        }
    }

    let user = state
        .db
        .users
        .get_by_username(&req.username)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid credentials".to_string()))?;

    if let Some(locked_until) = user.locked_until {
        if locked_until > Utc::now() {
            warn!(
                subsystem = "api",
                op = "login",
                user_id = %user.id,
                "Login attempt on locked account"
            );
            return Err(ApiError::Forbidden(
                "Account is temporarily locked after repeated failures".to_string(),
            ));
        }
    }

    if !verify_password(&req.password, &user.password_hash) {
        state.db.users.record_failed_login(user.id).await?;
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    }

    state.db.users.record_successful_login(user.id).await?;
    let session = state.db.sessions.create(user.id, SESSION_TTL_SECS).await?;

    info!(
        subsystem = "api",
        op = "login",
        user_id = %user.id,
        "Login successful"
    );
    Ok(Json(serde_json::json!({
        "token": session.token,
        "expires_at_utc": session.expires_at_utc,
        "user": user,
    })))
}

/// POST /api/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    if let Some(token) = bearer_token(&headers) {
        state.db.sessions.delete(token).await?;
    }
    Ok(Json(serde_json::json!({ "success": true })))
}

/// GET /api/auth/me
pub async fn me(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user = require_user(&state, &headers).await?;
    Ok(Json(serde_json::json!({ "user": user })))
}

/// POST /api/auth/verify
pub async fn verify_email(
    State(state): State<AppState>,
    Json(req): Json<VerifyRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user = state
        .db
        .users
        .get_by_username(&req.username)
        .await?
        .ok_or_else(|| ApiError::BadRequest("Invalid or expired code".to_string()))?;

    if !state.db.users.consume_pending_code(user.id, &req.code).await? {
        return Err(ApiError::BadRequest("Invalid or expired code".to_string()));
    }
    state.db.users.mark_email_verified(user.id).await?;

    info!(
        subsystem = "api",
        op = "verify_email",
        user_id = %user.id,
        "Email verified"
    );
    Ok(Json(serde_json::json!({ "success": true })))
}

/// POST /api/auth/request-reset
///
/// Responds identically whether or not the account exists.
pub async fn request_password_reset(
    State(state): State<AppState>,
    Json(req): Json<RequestResetRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if let Some(user) = state.db.users.get_by_username(&req.username).await? {
        let code = generate_code();
        let expires_at = Utc::now() + Duration::seconds(RESET_CODE_TTL_SECS);
        state
            .db
            .users
            .set_pending_code(user.id, &code, expires_at)
            .await?;

        let payload = serde_json::json!({
            "email": user.email,
            "username": user.username,
            "code": code,
        });
        state
            .db
            .jobs
            .queue(JobType::PasswordResetEmail, Some(payload))
            .await?;
    }

    Ok(Json(serde_json::json!({ "success": true })))
}

/// POST /api/auth/reset
pub async fn reset_password(
    State(state): State<AppState>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    validate_password(&req.new_password).map_err(ApiError::BadRequest)?;

    let user = state
        .db
        .users
        .get_by_username(&req.username)
        .await?
        .ok_or_else(|| ApiError::BadRequest("Invalid or expired code".to_string()))?;

    if !state.db.users.consume_pending_code(user.id, &req.code).await? {
        return Err(ApiError::BadRequest("Invalid or expired code".to_string()));
    }

    let password_hash = hash_password(&req.new_password)?;
    state.db.users.set_password(user.id, &password_hash).await?;
    // A successful reset also clears any lockout.
    state.db.users.record_successful_login(user.id).await?;

    info!(
        subsystem = "api",
        op = "reset_password",
        user_id = %user.id,
        "Password reset"
    );
    Ok(Json(serde_json::json!({ "success": true })))
}
