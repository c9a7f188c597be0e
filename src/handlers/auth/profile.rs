// GET /api/auth/profile - public fields of the authenticated user

use axum::{extract::State, response::Json, Extension};
use serde_json::Value;

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::state::AppState;

pub async fn profile_get(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<Value>, ApiError> {
    let user = state
        .users
        .find_by_id(auth_user.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(user.summary()))
}
