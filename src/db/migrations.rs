//! Database migrations
//!
//! Code-based migrations embedded in the binary for single-file deployment.
//! Each migration is a versioned block of SQL recorded in a `_migrations`
//! table so it runs exactly once.

use anyhow::{Context, Result};
use sqlx::{Row, SqlitePool};

/// A single versioned migration.
#[derive(Debug, Clone)]
pub struct Migration {
    /// Unique, sequential version number
    pub version: i32,
    /// Human-readable migration name
    pub name: &'static str,
    /// SQL statements, ';'-separated
    pub up: &'static str,
}

/// All migrations for the parking ledger.
///
/// The `entry` and `exit` columns are ISO-8601 text rather than typed
/// timestamps: the store must load even when a value is unparseable, so
/// parsing tolerance lives in the repository, not the schema.
pub const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "create_parking_sessions",
    up: r#"
        CREATE TABLE IF NOT EXISTS parking_sessions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            plate VARCHAR(20) NOT NULL,
            category VARCHAR(50) NOT NULL,
            entry VARCHAR(40),
            exit VARCHAR(40)
        );
        CREATE INDEX IF NOT EXISTS idx_sessions_plate ON parking_sessions(plate);
        CREATE INDEX IF NOT EXISTS idx_sessions_category ON parking_sessions(category);
        CREATE INDEX IF NOT EXISTS idx_sessions_exit ON parking_sessions(exit)
    "#,
}];

/// Run all pending migrations.
pub async fn run_migrations(pool: &SqlitePool) -> Result<usize> {
    create_migrations_table(pool).await?;

    let applied = applied_versions(pool).await?;
    let mut count = 0;

    for migration in MIGRATIONS {
        if !applied.contains(&migration.version) {
            tracing::info!(
                "Applying migration {}: {}",
                migration.version,
                migration.name
            );
            apply_migration(pool, migration)
                .await
                .with_context(|| format!("Failed to apply migration: {}", migration.name))?;
            count += 1;
        }
    }

    if count > 0 {
        tracing::info!("Applied {} migration(s)", count);
    } else {
        tracing::debug!("No pending migrations");
    }

    Ok(count)
}

async fn create_migrations_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            name VARCHAR(255) NOT NULL UNIQUE,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await
    .context("Failed to create _migrations table")?;
    Ok(())
}

async fn applied_versions(pool: &SqlitePool) -> Result<Vec<i32>> {
    let rows = sqlx::query("SELECT version FROM _migrations ORDER BY version")
        .fetch_all(pool)
        .await
        .context("Failed to read applied migrations")?;
    Ok(rows.iter().map(|row| row.get::<i32, _>("version")).collect())
}

async fn apply_migration(pool: &SqlitePool, migration: &Migration) -> Result<()> {
    for statement in migration.up.split(';') {
        let statement = statement.trim();
        if !statement.is_empty() {
            sqlx::query(statement)
                .execute(pool)
                .await
                .with_context(|| format!("Failed to execute migration statement: {}", statement))?;
        }
    }

    sqlx::query("INSERT INTO _migrations (version, name) VALUES (?, ?)")
        .bind(migration.version)
        .bind(migration.name)
        .execute(pool)
        .await?;

    Ok(())
}
