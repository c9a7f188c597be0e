//! Forward-only schema migrations with a persistent ledger.
//!
//! Migration scripts are versioned pairs named
//! `<version>_<name>.up.sql` / `<version>_<name>.down.sql`. The default set
//! is embedded from `migrations/` at build time, but the runner accepts any
//! list of scripts resolvable at startup. Each migration applies inside its
//! own transaction together with its ledger row, so a crash mid-script
//! never records a half-applied migration.

use std::collections::{BTreeMap, HashSet};

use sqlx::{Executor, PgPool};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("migration {version} failed: {source}")]
    Failed {
        version: i32,
        #[source]
        source: sqlx::Error,
    },

    #[error("migration {0} not found among discovered scripts")]
    NotFound(i32),

    #[error("migration {version} has no {direction} script")]
    MissingScript { version: i32, direction: &'static str },

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// A single named SQL resource, direction encoded in the file name.
#[derive(Debug, Clone)]
pub struct MigrationScript {
    pub file_name: String,
    pub sql: String,
}

impl MigrationScript {
    pub fn new(file_name: impl Into<String>, sql: impl Into<String>) -> Self {
        Self { file_name: file_name.into(), sql: sql.into() }
    }
}

/// Forward and backward scripts for one version, merged at discovery time.
#[derive(Debug, Clone)]
pub struct Migration {
    pub version: i32,
    pub name: String,
    pub up_sql: Option<String>,
    pub down_sql: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppliedMigration {
    pub version: i32,
    pub name: String,
}

/// Outcome of `run_pending`: the migrations applied by this invocation.
#[derive(Debug, Default)]
pub struct ApplyReport {
    pub applied: Vec<AppliedMigration>,
}

/// Outcome of `rollback_last`: `None` when the ledger was already empty.
#[derive(Debug)]
pub struct RollbackReport {
    pub rolled_back: Option<AppliedMigration>,
}

enum Direction {
    Up,
    Down,
}

/// The schema shipped with the binary.
pub fn embedded_scripts() -> Vec<MigrationScript> {
    macro_rules! script {
        ($name:literal) => {
            MigrationScript::new($name, include_str!(concat!("../../migrations/", $name)))
        };
    }

    vec![
        script!("001_create_users_table.up.sql"),
        script!("001_create_users_table.down.sql"),
        script!("002_create_gallery_table.up.sql"),
        script!("002_create_gallery_table.down.sql"),
        script!("003_create_date_requests_table.up.sql"),
        script!("003_create_date_requests_table.down.sql"),
        script!("004_create_chat_messages_table.up.sql"),
        script!("004_create_chat_messages_table.down.sql"),
        script!("005_create_notifications_table.up.sql"),
        script!("005_create_notifications_table.down.sql"),
    ]
}

/// Parse `<version>_<name>.up.sql` / `<version>_<name>.down.sql`.
/// Returns None for entries that do not follow the convention.
fn parse_file_name(file_name: &str) -> Option<(i32, String, Direction)> {
    let (stem, direction) = if let Some(stem) = file_name.strip_suffix(".up.sql") {
        (stem, Direction::Up)
    } else if let Some(stem) = file_name.strip_suffix(".down.sql") {
        (stem, Direction::Down)
    } else {
        return None;
    };

    let (version_part, name) = stem.split_once('_')?;
    let version: i32 = version_part.parse().ok()?;
    if version < 0 || name.is_empty() {
        return None;
    }

    Some((version, name.to_string(), direction))
}

/// Merge raw scripts into logical migrations, sorted by version ascending.
///
/// A version contributed by only one direction is legal; the missing side
/// stays `None` until the runner actually needs it. Two scripts with the
/// same version and direction: last one wins.
fn load_migrations(scripts: &[MigrationScript]) -> Vec<Migration> {
    let mut by_version: BTreeMap<i32, Migration> = BTreeMap::new();

    for script in scripts {
        let Some((version, name, direction)) = parse_file_name(&script.file_name) else {
            continue;
        };

        let migration = by_version.entry(version).or_insert_with(|| Migration {
            version,
            name: name.clone(),
            up_sql: None,
            down_sql: None,
        });

        match direction {
            Direction::Up => migration.up_sql = Some(script.sql.clone()),
            Direction::Down => migration.down_sql = Some(script.sql.clone()),
        }
    }

    by_version.into_values().collect()
}

/// Applies pending migrations and rolls back the most recent one.
pub struct MigrationRunner {
    pool: PgPool,
    scripts: Vec<MigrationScript>,
}

impl MigrationRunner {
    /// Runner over the embedded migration set.
    pub fn new(pool: PgPool) -> Self {
        Self::with_scripts(pool, embedded_scripts())
    }

    /// Runner over an explicit script list (tests, operator tooling).
    pub fn with_scripts(pool: PgPool, scripts: Vec<MigrationScript>) -> Self {
        Self { pool, scripts }
    }

    async fn ensure_ledger(&self) -> Result<(), sqlx::Error> {
        self.pool
            .execute(
                r#"
                CREATE TABLE IF NOT EXISTS schema_migrations (
                    version INTEGER PRIMARY KEY,
                    name VARCHAR(255) NOT NULL,
                    applied_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
                )
                "#,
            )
            .await?;
        Ok(())
    }

    async fn applied_versions(&self) -> Result<HashSet<i32>, sqlx::Error> {
        let rows: Vec<(i32,)> = sqlx::query_as("SELECT version FROM schema_migrations")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|(version,)| version).collect())
    }

    /// Apply every discovered migration not yet in the ledger, in ascending
    /// version order, one transaction per migration.
    ///
    /// A failure aborts the run with that migration rolled back; migrations
    /// committed by earlier iterations stay applied. With nothing pending
    /// this performs zero writes.
    pub async fn run_pending(&self) -> Result<ApplyReport, MigrationError> {
        self.ensure_ledger().await?;
        let applied = self.applied_versions().await?;
        let migrations = load_migrations(&self.scripts);

        let mut report = ApplyReport::default();

        for migration in migrations {
            if applied.contains(&migration.version) {
                continue;
            }

            let up_sql = migration.up_sql.as_deref().ok_or(MigrationError::MissingScript {
                version: migration.version,
                direction: "up",
            })?;

            info!("Applying migration {}: {}", migration.version, migration.name);

            let mut tx = self.pool.begin().await?;

            // Dropping the transaction on any error path rolls it back, so a
            // failed script never leaves its ledger row behind.
            (&mut *tx)
                .execute(up_sql)
                .await
                .map_err(|source| MigrationError::Failed { version: migration.version, source })?;

            sqlx::query("INSERT INTO schema_migrations (version, name) VALUES ($1, $2)")
                .bind(migration.version)
                .bind(&migration.name)
                .execute(&mut *tx)
                .await
                .map_err(|source| MigrationError::Failed { version: migration.version, source })?;

            tx.commit()
                .await
                .map_err(|source| MigrationError::Failed { version: migration.version, source })?;

            report.applied.push(AppliedMigration {
                version: migration.version,
                name: migration.name,
            });
        }

        if report.applied.is_empty() {
            info!("Schema is up to date");
        } else {
            info!("Applied {} migration(s)", report.applied.len());
        }

        Ok(report)
    }

    /// Roll back the single highest applied migration, removing its ledger
    /// row in the same transaction. A no-op when the ledger is empty.
    pub async fn rollback_last(&self) -> Result<RollbackReport, MigrationError> {
        self.ensure_ledger().await?;

        let last: Option<(i32, String)> = sqlx::query_as(
            "SELECT version, name FROM schema_migrations ORDER BY version DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        let Some((version, name)) = last else {
            info!("No migrations to roll back");
            return Ok(RollbackReport { rolled_back: None });
        };

        // Discovery runs fresh per invocation; scripts deleted since the
        // migration was applied surface here.
        let migrations = load_migrations(&self.scripts);
        let migration = migrations
            .into_iter()
            .find(|m| m.version == version)
            .ok_or(MigrationError::NotFound(version))?;

        let down_sql = migration
            .down_sql
            .as_deref()
            .ok_or(MigrationError::MissingScript { version, direction: "down" })?;

        info!("Rolling back migration {}: {}", version, name);

        let mut tx = self.pool.begin().await?;

        (&mut *tx)
            .execute(down_sql)
            .await
            .map_err(|source| MigrationError::Failed { version, source })?;

        sqlx::query("DELETE FROM schema_migrations WHERE version = $1")
            .bind(version)
            .execute(&mut *tx)
            .await
            .map_err(|source| MigrationError::Failed { version, source })?;

        tx.commit()
            .await
            .map_err(|source| MigrationError::Failed { version, source })?;

        Ok(RollbackReport { rolled_back: Some(AppliedMigration { version, name }) })
    }
}
