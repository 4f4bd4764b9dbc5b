//! Database migrations
//!
//! Code-based migrations embedded as SQL strings for single-binary
//! deployment. Each migration carries a unique version; applied versions
//! are tracked in `_migrations` and skipped on subsequent startups.
//!
//! Records are stored without a status column on purpose: status is a
//! computed view over the expiry date/time, derived on every read.

use anyhow::{Context, Result};
use sqlx::{Row, SqlitePool};

/// A database migration
#[derive(Debug, Clone)]
pub struct Migration {
    /// Migration version number (unique and sequential)
    pub version: i32,
    /// Human-readable migration name
    pub name: &'static str,
    /// SQL statements to apply
    pub up: &'static str,
}

/// All migrations for the ShelfCheck service
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "create_users",
        up: r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            role TEXT NOT NULL,
            name TEXT NOT NULL,
            store TEXT NOT NULL,
            approved INTEGER NOT NULL DEFAULT 0
        );
        "#,
    },
    Migration {
        version: 2,
        name: "create_templates",
        up: r#"
        CREATE TABLE IF NOT EXISTS templates (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            image_url TEXT NOT NULL DEFAULT '',
            shelf_life_days INTEGER NOT NULL,
            periods TEXT NOT NULL,
            product_group TEXT NOT NULL
        );
        "#,
    },
    Migration {
        version: 3,
        name: "create_records",
        up: r#"
        CREATE TABLE IF NOT EXISTS records (
            id TEXT PRIMARY KEY,
            template_id TEXT NOT NULL,
            product_name TEXT NOT NULL,
            image_url TEXT NOT NULL DEFAULT '',
            expiry_date TEXT NOT NULL,
            recorded_time TEXT NOT NULL,
            period TEXT NOT NULL,
            store TEXT NOT NULL,
            created_by_id TEXT NOT NULL,
            created_by_name TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_records_expiry_date ON records(expiry_date);
        "#,
    },
];

/// Run all pending migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        "#,
    )
    .execute(pool)
    .await
    .context("Failed to create migrations table")?;

    for migration in MIGRATIONS {
        let applied = sqlx::query("SELECT version FROM _migrations WHERE version = ?")
            .bind(migration.version)
            .fetch_optional(pool)
            .await
            .context("Failed to query applied migrations")?
            .is_some();

        if applied {
            continue;
        }

        tracing::info!(
            version = migration.version,
            name = migration.name,
            "Applying migration"
        );

        // SQLite executes one statement per query call
        for statement in migration.up.split(';') {
            let statement = statement.trim();
            if statement.is_empty() {
                continue;
            }
            sqlx::query(statement)
                .execute(pool)
                .await
                .with_context(|| format!("Migration {} failed", migration.name))?;
        }

        sqlx::query("INSERT INTO _migrations (version, name) VALUES (?, ?)")
            .bind(migration.version)
            .bind(migration.name)
            .execute(pool)
            .await
            .context("Failed to record migration")?;
    }

    Ok(())
}

/// Number of applied migrations
pub async fn applied_count(pool: &SqlitePool) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM _migrations")
        .fetch_one(pool)
        .await?;
    Ok(row.get("count"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;

    #[tokio::test]
    async fn test_migrations_apply_cleanly() {
        let pool = create_test_pool().await.unwrap();
        run_migrations(&pool).await.unwrap();
        assert_eq!(applied_count(&pool).await.unwrap(), MIGRATIONS.len() as i64);
    }

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let pool = create_test_pool().await.unwrap();
        run_migrations(&pool).await.unwrap();
        run_migrations(&pool).await.unwrap();
        assert_eq!(applied_count(&pool).await.unwrap(), MIGRATIONS.len() as i64);
    }

    #[test]
    fn test_migration_versions_are_unique_and_ordered() {
        let mut versions: Vec<i32> = MIGRATIONS.iter().map(|m| m.version).collect();
        let declared = versions.clone();
        versions.sort_unstable();
        versions.dedup();
        assert_eq!(versions, declared);
    }
}
