// GET /api/admin/users - super-admin listing of all accounts

use axum::{extract::State, response::Json};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::state::AppState;

pub async fn users_get(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let users = state.users.list().await?;
    let summaries: Vec<Value> = users.iter().map(|u| u.summary()).collect();

    Ok(Json(json!({ "users": summaries })))
}
