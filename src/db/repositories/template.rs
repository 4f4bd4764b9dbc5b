//! Template repository
//!
//! Data access for catalog templates. Periods are stored as a
//! comma-joined string, the product group as its lowercase name.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::models::{Period, ProductGroup, ProductTemplate};

/// Template repository trait
#[async_trait]
pub trait TemplateRepository: Send + Sync {
    /// List all templates
    async fn list(&self) -> Result<Vec<ProductTemplate>>;

    /// Get a template by id
    async fn get(&self, id: &str) -> Result<Option<ProductTemplate>>;

    /// Create a new template
    async fn create(&self, template: &ProductTemplate) -> Result<()>;

    /// Delete a template. Returns whether it existed.
    async fn delete(&self, id: &str) -> Result<bool>;
}

// ============================================================================
// SQLite implementation
// ============================================================================

/// SQLx-based template repository
pub struct SqlxTemplateRepository {
    pool: SqlitePool,
}

impl SqlxTemplateRepository {
    /// Create a new SQLx template repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for dependency injection
    pub fn boxed(pool: SqlitePool) -> Arc<dyn TemplateRepository> {
        Arc::new(Self::new(pool))
    }
}

fn periods_to_column(periods: &[Period]) -> String {
    periods
        .iter()
        .map(Period::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

fn periods_from_column(column: &str) -> Result<Vec<Period>> {
    column
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|s| Period::from_str(s.trim()))
        .collect()
}

fn row_to_template(row: &sqlx::sqlite::SqliteRow) -> Result<ProductTemplate> {
    let periods: String = row.get("periods");
    let group: String = row.get("product_group");
    Ok(ProductTemplate {
        id: row.get("id"),
        name: row.get("name"),
        image_url: row.get("image_url"),
        shelf_life_days: row.get("shelf_life_days"),
        periods: periods_from_column(&periods)?,
        group: ProductGroup::from_str(&group)?,
    })
}

#[async_trait]
impl TemplateRepository for SqlxTemplateRepository {
    async fn list(&self) -> Result<Vec<ProductTemplate>> {
        let rows = sqlx::query("SELECT * FROM templates ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list templates")?;

        rows.iter().map(row_to_template).collect()
    }

    async fn get(&self, id: &str) -> Result<Option<ProductTemplate>> {
        let row = sqlx::query("SELECT * FROM templates WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get template")?;

        row.as_ref().map(row_to_template).transpose()
    }

    async fn create(&self, template: &ProductTemplate) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO templates (id, name, image_url, shelf_life_days, periods, product_group)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&template.id)
        .bind(&template.name)
        .bind(&template.image_url)
        .bind(template.shelf_life_days)
        .bind(periods_to_column(&template.periods))
        .bind(template.group.to_string())
        .execute(&self.pool)
        .await
        .context("Failed to create template")?;

        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM templates WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete template")?;

        Ok(result.rows_affected() > 0)
    }
}

// ============================================================================
// In-memory implementation
// ============================================================================

/// In-memory template repository, used when no database is configured
/// and as a test fixture
#[derive(Default)]
pub struct MemoryTemplateRepository {
    templates: RwLock<Vec<ProductTemplate>>,
}

impl MemoryTemplateRepository {
    /// Create an empty in-memory repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a boxed repository for dependency injection
    pub fn boxed() -> Arc<dyn TemplateRepository> {
        Arc::new(Self::new())
    }
}

#[async_trait]
impl TemplateRepository for MemoryTemplateRepository {
    async fn list(&self) -> Result<Vec<ProductTemplate>> {
        let mut templates = self.templates.read().await.clone();
        templates.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(templates)
    }

    async fn get(&self, id: &str) -> Result<Option<ProductTemplate>> {
        Ok(self
            .templates
            .read()
            .await
            .iter()
            .find(|t| t.id == id)
            .cloned())
    }

    async fn create(&self, template: &ProductTemplate) -> Result<()> {
        self.templates.write().await.push(template.clone());
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let mut templates = self.templates.write().await;
        let before = templates.len();
        templates.retain(|t| t.id != id);
        Ok(templates.len() != before)
    }
}
