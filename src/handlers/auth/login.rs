// POST /api/auth/login - authenticate and receive access + refresh tokens

use axum::{extract::State, response::Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Validate credentials and issue both token categories.
///
/// Unknown email and wrong password produce the same response; the caller
/// learns nothing about which check failed.
pub async fn login_post(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<Value>, ApiError> {
    let user = state
        .users
        .find_by_email(&req.email)
        .await?
        .ok_or_else(invalid_credentials)?;

    if !auth::verify_password(&req.password, &user.password_hash) {
        tracing::warn!("Failed login attempt for {}", req.email);
        return Err(invalid_credentials());
    }

    let token = state
        .auth
        .issue_access(user.id, &user.username, user.role)
        .map_err(|e| {
            tracing::error!("Token generation failed: {}", e);
            ApiError::internal_server_error("Failed to generate token")
        })?;

    let refresh_token = state
        .auth
        .issue_refresh(user.id, &user.username, user.role)
        .map_err(|e| {
            tracing::error!("Refresh token generation failed: {}", e);
            ApiError::internal_server_error("Failed to generate refresh token")
        })?;

    Ok(Json(json!({
        "message": "Login successful",
        "token": token,
        "refresh_token": refresh_token,
        "expires_in": state.auth.access_expires_in(),
        "user": user.summary(),
    })))
}

fn invalid_credentials() -> ApiError {
    ApiError::unauthorized("Invalid credentials")
}
