//! Record repository
//!
//! Data access for validity records. No status column exists: status is
//! derived from the expiry date/time at read time by the service layer.
//! Listing orders by expiry date ascending so the soonest-expiring
//! products surface first.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::models::{Period, RecordedTime, ValidityRecord};

/// Record repository trait
#[async_trait]
pub trait RecordRepository: Send + Sync {
    /// List all records, soonest expiry first
    async fn list(&self) -> Result<Vec<ValidityRecord>>;

    /// Create a new record
    async fn create(&self, record: &ValidityRecord) -> Result<()>;

    /// Delete a record. Returns whether it existed.
    ///
    /// Authorization is the service layer's responsibility; this is raw
    /// data access.
    async fn delete(&self, id: &str) -> Result<bool>;
}

// ============================================================================
// SQLite implementation
// ============================================================================

/// SQLx-based record repository
pub struct SqlxRecordRepository {
    pool: SqlitePool,
}

impl SqlxRecordRepository {
    /// Create a new SQLx record repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for dependency injection
    pub fn boxed(pool: SqlitePool) -> Arc<dyn RecordRepository> {
        Arc::new(Self::new(pool))
    }
}

fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> Result<ValidityRecord> {
    let expiry_date: String = row.get("expiry_date");
    let recorded_time: String = row.get("recorded_time");
    let period: String = row.get("period");

    Ok(ValidityRecord {
        id: row.get("id"),
        template_id: row.get("template_id"),
        product_name: row.get("product_name"),
        image_url: row.get("image_url"),
        expiry_date: NaiveDate::parse_from_str(&expiry_date, "%Y-%m-%d")
            .with_context(|| format!("Invalid expiry date in storage: {}", expiry_date))?,
        recorded_time: RecordedTime::from_str(&recorded_time)?,
        period: Period::from_str(&period)?,
        store: row.get("store"),
        created_by_id: row.get("created_by_id"),
        created_by_name: row.get("created_by_name"),
    })
}

#[async_trait]
impl RecordRepository for SqlxRecordRepository {
    async fn list(&self) -> Result<Vec<ValidityRecord>> {
        let rows = sqlx::query("SELECT * FROM records ORDER BY expiry_date ASC")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list records")?;

        rows.iter().map(row_to_record).collect()
    }

    async fn create(&self, record: &ValidityRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO records (
                id, template_id, product_name, image_url, expiry_date,
                recorded_time, period, store, created_by_id, created_by_name
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(&record.template_id)
        .bind(&record.product_name)
        .bind(&record.image_url)
        .bind(record.expiry_date.format("%Y-%m-%d").to_string())
        .bind(record.recorded_time.to_string())
        .bind(record.period.to_string())
        .bind(&record.store)
        .bind(&record.created_by_id)
        .bind(&record.created_by_name)
        .execute(&self.pool)
        .await
        .context("Failed to create record")?;

        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM records WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete record")?;

        Ok(result.rows_affected() > 0)
    }
}

// ============================================================================
// In-memory implementation
// ============================================================================

/// In-memory record repository, used when no database is configured and
/// as a test fixture
#[derive(Default)]
pub struct MemoryRecordRepository {
    records: RwLock<Vec<ValidityRecord>>,
}

impl MemoryRecordRepository {
    /// Create an empty in-memory repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a boxed repository for dependency injection
    pub fn boxed() -> Arc<dyn RecordRepository> {
        Arc::new(Self::new())
    }
}

#[async_trait]
impl RecordRepository for MemoryRecordRepository {
    async fn list(&self) -> Result<Vec<ValidityRecord>> {
        let mut records = self.records.read().await.clone();
        records.sort_by_key(|r| r.expiry_date);
        Ok(records)
    }

    async fn create(&self, record: &ValidityRecord) -> Result<()> {
        self.records.write().await.push(record.clone());
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|r| r.id != id);
        Ok(records.len() != before)
    }
}
