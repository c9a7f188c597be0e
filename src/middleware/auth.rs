use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::auth::{Claims, TokenKind};
use crate::database::UserRole;
use crate::error::ApiError;
use crate::state::AppState;

/// Authenticated identity extracted from a validated bearer token.
///
/// Carried as a typed request extension, so downstream handlers take it via
/// `Extension<AuthUser>` instead of a stringly-keyed context map.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: i64,
    pub username: String,
    pub role: UserRole,
    pub token_type: TokenKind,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            username: claims.username,
            role: claims.role,
            token_type: claims.token_type,
        }
    }
}

/// Authentication middleware: requires `Authorization: Bearer <token>`,
/// validates the token, and injects the identity into the request.
///
/// Every failure short-circuits with 401 before any handler runs.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(request.headers())?;
    let claims = state.auth.validate(&token).map_err(ApiError::from)?;

    request.extensions_mut().insert(AuthUser::from(claims));
    Ok(next.run(request).await)
}

/// Extract the token from the Authorization header. The header must be
/// exactly two space-separated parts with a `Bearer` scheme.
fn extract_bearer_token(headers: &HeaderMap) -> Result<String, ApiError> {
    let header = headers
        .get("authorization")
        .ok_or_else(|| ApiError::unauthorized("Authorization header required"))?;

    let value = header
        .to_str()
        .map_err(|_| ApiError::unauthorized("Invalid authorization format"))?;

    let parts: Vec<&str> = value.split(' ').collect();
    if parts.len() != 2 || parts[0] != "Bearer" || parts[1].is_empty() {
        return Err(ApiError::unauthorized("Invalid authorization format"));
    }

    Ok(parts[1].to_string())
}
