//! SQLite connection pool

use anyhow::{Context, Result};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

/// Create a SQLite connection pool for the given path/URL.
///
/// File-based databases get their parent directory created and are opened
/// with `mode=rwc` so a fresh deployment bootstraps itself.
pub async fn create_pool(url: &str) -> Result<SqlitePool> {
    let connection_url = if url == ":memory:" || url == "sqlite::memory:" {
        "sqlite::memory:".to_string()
    } else {
        let path = url.trim_start_matches("sqlite:");

        if let Some(parent) = std::path::Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create database directory: {:?}", parent)
                })?;
            }
        }

        if path.contains('?') {
            format!("sqlite:{}", path)
        } else {
            format!("sqlite:{}?mode=rwc", path)
        }
    };

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&connection_url)
        .await
        .with_context(|| format!("Failed to connect to database: {}", url))?;

    Ok(pool)
}

/// Create an in-memory pool for tests
pub async fn create_test_pool() -> Result<SqlitePool> {
    create_pool(":memory:").await
}
