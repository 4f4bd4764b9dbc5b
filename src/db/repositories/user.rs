//! User repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::models::{User, UserRole};

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// List all users
    async fn list(&self) -> Result<Vec<User>>;

    /// Get a user by id
    async fn get(&self, id: &str) -> Result<Option<User>>;

    /// Get a user by email
    async fn get_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Create a new user
    async fn create(&self, user: &User) -> Result<()>;

    /// Set the approval flag. Returns whether the user existed.
    async fn set_approved(&self, id: &str, approved: bool) -> Result<bool>;

    /// Delete a user. Returns whether the user existed.
    async fn delete(&self, id: &str) -> Result<bool>;
}

// ============================================================================
// SQLite implementation
// ============================================================================

/// SQLx-based user repository
pub struct SqlxUserRepository {
    pool: SqlitePool,
}

impl SqlxUserRepository {
    /// Create a new SQLx user repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for dependency injection
    pub fn boxed(pool: SqlitePool) -> Arc<dyn UserRepository> {
        Arc::new(Self::new(pool))
    }
}

fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> Result<User> {
    let role: String = row.get("role");
    let approved: i64 = row.get("approved");
    Ok(User {
        id: row.get("id"),
        email: row.get("email"),
        role: UserRole::from_str(&role)?,
        name: row.get("name"),
        store: row.get("store"),
        approved: approved != 0,
    })
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn list(&self) -> Result<Vec<User>> {
        let rows = sqlx::query("SELECT * FROM users ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list users")?;

        rows.iter().map(row_to_user).collect()
    }

    async fn get(&self, id: &str) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get user")?;

        row.as_ref().map(row_to_user).transpose()
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get user by email")?;

        row.as_ref().map(row_to_user).transpose()
    }

    async fn create(&self, user: &User) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, role, name, store, approved)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(user.role.to_string())
        .bind(&user.name)
        .bind(&user.store)
        .bind(user.approved as i64)
        .execute(&self.pool)
        .await
        .context("Failed to create user")?;

        Ok(())
    }

    async fn set_approved(&self, id: &str, approved: bool) -> Result<bool> {
        let result = sqlx::query("UPDATE users SET approved = ? WHERE id = ?")
            .bind(approved as i64)
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to update user approval")?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete user")?;

        Ok(result.rows_affected() > 0)
    }
}

// ============================================================================
// In-memory implementation
// ============================================================================

/// In-memory user repository, used when no database is configured and as
/// a test fixture
#[derive(Default)]
pub struct MemoryUserRepository {
    users: RwLock<Vec<User>>,
}

impl MemoryUserRepository {
    /// Create an empty in-memory repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a boxed repository for dependency injection
    pub fn boxed() -> Arc<dyn UserRepository> {
        Arc::new(Self::new())
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn list(&self) -> Result<Vec<User>> {
        let mut users = self.users.read().await.clone();
        users.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(users)
    }

    async fn get(&self, id: &str) -> Result<Option<User>> {
        Ok(self.users.read().await.iter().find(|u| u.id == id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn create(&self, user: &User) -> Result<()> {
        self.users.write().await.push(user.clone());
        Ok(())
    }

    async fn set_approved(&self, id: &str, approved: bool) -> Result<bool> {
        let mut users = self.users.write().await;
        match users.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                user.approved = approved;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let mut users = self.users.write().await;
        let before = users.len();
        users.retain(|u| u.id != id);
        Ok(users.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    fn user(id: &str, email: &str, role: UserRole) -> User {
        User {
            id: id.to_string(),
            email: email.to_string(),
            role,
            name: format!("User {}", id),
            store: "Downtown".to_string(),
            approved: false,
        }
    }

    async fn sqlx_repo() -> SqlxUserRepository {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        SqlxUserRepository::new(pool)
    }

    #[tokio::test]
    async fn test_sqlx_round_trip() {
        let repo = sqlx_repo().await;
        repo.create(&user("u1", "a@example.com", UserRole::Manager))
            .await
            .unwrap();

        let fetched = repo.get("u1").await.unwrap().unwrap();
        assert_eq!(fetched.role, UserRole::Manager);
        assert!(!fetched.approved);

        let by_email = repo.get_by_email("a@example.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, "u1");
    }

    #[tokio::test]
    async fn test_sqlx_set_approved() {
        let repo = sqlx_repo().await;
        repo.create(&user("u1", "a@example.com", UserRole::Operator))
            .await
            .unwrap();

        assert!(repo.set_approved("u1", true).await.unwrap());
        assert!(repo.get("u1").await.unwrap().unwrap().approved);
        assert!(!repo.set_approved("missing", true).await.unwrap());
    }

    #[tokio::test]
    async fn test_sqlx_duplicate_email_rejected() {
        let repo = sqlx_repo().await;
        repo.create(&user("u1", "a@example.com", UserRole::Operator))
            .await
            .unwrap();

        let result = repo
            .create(&user("u2", "a@example.com", UserRole::Operator))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_memory_approval_and_delete() {
        let repo = MemoryUserRepository::new();
        repo.create(&user("u1", "a@example.com", UserRole::Operator))
            .await
            .unwrap();

        assert!(repo.set_approved("u1", true).await.unwrap());
        assert!(repo.get("u1").await.unwrap().unwrap().approved);
        assert!(repo.delete("u1").await.unwrap());
        assert!(!repo.delete("u1").await.unwrap());
    }
}
