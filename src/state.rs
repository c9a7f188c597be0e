use std::sync::Arc;

use sqlx::PgPool;

use crate::auth::AuthService;
use crate::database::UserRepository;

/// Shared per-process state handed to handlers and middleware.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub auth: AuthService,
    pub users: Arc<dyn UserRepository>,
}

impl AppState {
    pub fn new(pool: PgPool, auth: AuthService, users: Arc<dyn UserRepository>) -> Self {
        Self { pool, auth, users }
    }
}
