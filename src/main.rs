use std::sync::Arc;

use anyhow::Context;

use fasisi_api::auth::AuthService;
use fasisi_api::config;
use fasisi_api::database::{pool, seed, MigrationRunner, PgUserRepository};
use fasisi_api::routes;
use fasisi_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up JWT_SECRET, DB_*, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    // Configuration failures are fatal before anything else starts.
    let config = config::init(config::AppConfig::from_env().context("failed to load configuration")?);

    let pool = pool::connect(&config.database)
        .await
        .context("failed to connect to database")?;

    // The schema must be current before any request is served.
    tracing::info!("Running database migrations...");
    let report = MigrationRunner::new(pool.clone())
        .run_pending()
        .await
        .context("failed to run migrations")?;
    tracing::info!("Database migrations completed ({} applied)", report.applied.len());

    let users = Arc::new(PgUserRepository::new(pool.clone()));
    seed::seed_users(users.as_ref(), &seed::default_seed())
        .await
        .context("failed to seed users")?;

    let auth = AuthService::from_config(&config.security);
    let app = routes::app(AppState::new(pool, auth, users));

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Server listening on http://{}", bind_addr);
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
