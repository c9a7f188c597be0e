use axum::{
    extract::State,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers;
use crate::middleware::{require_admin, require_auth};
use crate::state::AppState;

/// Assemble the full application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        // Public auth routes (token acquisition)
        .route("/api/auth/login", post(handlers::auth::login_post))
        .route("/api/auth/refresh", post(handlers::auth::refresh_post))
        // Protected routes
        .merge(protected_routes(&state))
        .merge(admin_routes(&state))
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn protected_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/api/auth/profile", get(handlers::auth::profile_get))
        .route_layer(from_fn_with_state(state.clone(), require_auth))
}

fn admin_routes(state: &AppState) -> Router<AppState> {
    // route_layer runs last-added first, so authentication precedes the
    // role check.
    Router::new()
        .route("/api/admin/users", get(handlers::admin::users_get))
        .route_layer(from_fn(require_admin))
        .route_layer(from_fn_with_state(state.clone(), require_auth))
}

async fn health(State(state): State<AppState>) -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match crate::database::pool::health_check(&state.pool).await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "status": "OK",
                "message": "Server is running",
                "timestamp": now,
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "status": "degraded",
                "message": "database unavailable",
                "timestamp": now,
                "database_error": e.to_string(),
            })),
        ),
    }
}
