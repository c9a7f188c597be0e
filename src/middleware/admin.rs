use axum::{extract::Request, middleware::Next, response::Response};

use super::auth::AuthUser;
use crate::error::ApiError;

/// Authorization middleware: requires a super-admin identity.
///
/// Must be layered after `require_auth`; a missing `AuthUser` extension
/// means authentication never ran and is treated as unauthenticated, not as
/// a server error.
pub async fn require_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    let auth_user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    if !auth_user.role.is_admin() {
        tracing::warn!(
            "User {} denied admin access (role: {})",
            auth_user.username,
            auth_user.role
        );
        return Err(ApiError::forbidden("Admin access required"));
    }

    Ok(next.run(request).await)
}
