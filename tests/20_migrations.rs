mod common;

use std::str::FromStr;

use anyhow::Result;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;

use fasisi_api::database::migrations::{
    embedded_scripts, MigrationError, MigrationRunner, MigrationScript,
};
use fasisi_api::database::{seed, PgUserRepository, UserRepository};

// These tests need a live PostgreSQL; they skip cleanly when DATABASE_URL
// is not set. Each test works inside its own schema so runs are isolated
// and repeatable.
async fn schema_pool(schema: &str) -> Result<Option<PgPool>> {
    let Some(url) = common::database_url() else {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(None);
    };

    let admin = PgPoolOptions::new().max_connections(1).connect(&url).await?;
    sqlx::query(&format!("DROP SCHEMA IF EXISTS {} CASCADE", schema))
        .execute(&admin)
        .await?;
    sqlx::query(&format!("CREATE SCHEMA {}", schema)).execute(&admin).await?;

    let options = PgConnectOptions::from_str(&url)?.options([("search_path", schema)]);
    let pool = PgPoolOptions::new().max_connections(2).connect_with(options).await?;
    Ok(Some(pool))
}

fn three_migrations() -> Vec<MigrationScript> {
    vec![
        MigrationScript::new("1_one.up.sql", "CREATE TABLE t_one (id INTEGER PRIMARY KEY);"),
        MigrationScript::new("1_one.down.sql", "DROP TABLE t_one;"),
        MigrationScript::new("2_two.up.sql", "CREATE TABLE t_two (id INTEGER PRIMARY KEY);"),
        MigrationScript::new("2_two.down.sql", "DROP TABLE t_two;"),
        MigrationScript::new("3_three.up.sql", "CREATE TABLE t_three (id INTEGER PRIMARY KEY);"),
        MigrationScript::new("3_three.down.sql", "DROP TABLE t_three;"),
    ]
}

async fn ledger_versions(pool: &PgPool) -> Result<Vec<i32>> {
    let rows: Vec<(i32,)> =
        sqlx::query_as("SELECT version FROM schema_migrations ORDER BY version")
            .fetch_all(pool)
            .await?;
    Ok(rows.into_iter().map(|(v,)| v).collect())
}

#[tokio::test]
async fn run_pending_is_idempotent() -> Result<()> {
    let Some(pool) = schema_pool("mig_idempotent").await? else { return Ok(()) };

    let runner = MigrationRunner::with_scripts(pool.clone(), three_migrations());

    let first = runner.run_pending().await?;
    assert_eq!(first.applied.len(), 3);
    assert_eq!(ledger_versions(&pool).await?, vec![1, 2, 3]);

    // Second invocation with nothing pending performs zero writes
    let second = runner.run_pending().await?;
    assert!(second.applied.is_empty());
    assert_eq!(ledger_versions(&pool).await?, vec![1, 2, 3]);

    Ok(())
}

#[tokio::test]
async fn failed_migration_keeps_earlier_commits_and_records_nothing_for_itself() -> Result<()> {
    let Some(pool) = schema_pool("mig_partial").await? else { return Ok(()) };

    let mut scripts = three_migrations();
    scripts[4] = MigrationScript::new("3_three.up.sql", "CREATE TABEL broken (id INTEGER);");

    let runner = MigrationRunner::with_scripts(pool.clone(), scripts);
    let err = runner.run_pending().await.unwrap_err();
    assert!(matches!(err, MigrationError::Failed { version: 3, .. }), "got {:?}", err);

    // Versions 1 and 2 committed before the failure stay applied; 3 left no
    // trace in the ledger.
    assert_eq!(ledger_versions(&pool).await?, vec![1, 2]);

    Ok(())
}

#[tokio::test]
async fn rollback_unwinds_exactly_one_step_per_call() -> Result<()> {
    let Some(pool) = schema_pool("mig_rollback").await? else { return Ok(()) };

    let runner = MigrationRunner::with_scripts(pool.clone(), three_migrations());
    runner.run_pending().await?;

    let report = runner.rollback_last().await?;
    assert_eq!(report.rolled_back.as_ref().map(|m| m.version), Some(3));
    assert_eq!(ledger_versions(&pool).await?, vec![1, 2]);

    let report = runner.rollback_last().await?;
    assert_eq!(report.rolled_back.as_ref().map(|m| m.version), Some(2));
    assert_eq!(ledger_versions(&pool).await?, vec![1]);

    let report = runner.rollback_last().await?;
    assert_eq!(report.rolled_back.as_ref().map(|m| m.version), Some(1));

    // Empty ledger rolls back as a no-op
    let report = runner.rollback_last().await?;
    assert!(report.rolled_back.is_none());

    Ok(())
}

#[tokio::test]
async fn rollback_fails_when_the_applied_script_has_disappeared() -> Result<()> {
    let Some(pool) = schema_pool("mig_missing").await? else { return Ok(()) };

    MigrationRunner::with_scripts(pool.clone(), three_migrations())
        .run_pending()
        .await?;

    // Scripts deleted after being applied: the version is in the ledger but
    // no longer discoverable.
    let bare = MigrationRunner::with_scripts(pool.clone(), Vec::new());
    let err = bare.rollback_last().await.unwrap_err();
    assert!(matches!(err, MigrationError::NotFound(3)), "got {:?}", err);
    assert_eq!(ledger_versions(&pool).await?, vec![1, 2, 3]);

    Ok(())
}

#[tokio::test]
async fn embedded_schema_applies_and_seed_is_idempotent() -> Result<()> {
    let Some(pool) = schema_pool("mig_seed").await? else { return Ok(()) };

    let report = MigrationRunner::with_scripts(pool.clone(), embedded_scripts())
        .run_pending()
        .await?;
    assert_eq!(report.applied.len(), 5);

    let repo = PgUserRepository::new(pool.clone());
    seed::seed_users(&repo, &seed::default_seed()).await?;
    // Second attempt hits the uniqueness constraints and is still Ok
    seed::seed_users(&repo, &seed::default_seed()).await?;

    let users = repo.list().await?;
    assert_eq!(users.len(), 2);

    let irfan = repo.find_by_email("irfan@fasisi.com").await?.unwrap();
    assert!(irfan.role.is_admin());
    assert!(fasisi_api::auth::verify_password("irfan123", &irfan.password_hash));

    Ok(())
}
