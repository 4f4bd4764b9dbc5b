//! User service
//!
//! Registration and the admin-gated account operations. New accounts start
//! unapproved; an unapproved user cannot start a working session until an
//! admin flips the flag.

use std::sync::Arc;
use uuid::Uuid;

use crate::db::repositories::UserRepository;
use crate::models::{CreateUserInput, User, UserRole};

/// Error types for user operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// Invalid input
    #[error("Validation error: {0}")]
    Validation(String),

    /// A user with this email already exists
    #[error("User already exists: {0}")]
    Exists(String),

    /// User does not exist
    #[error("User not found: {0}")]
    NotFound(String),

    /// Acting user lacks the required capability
    #[error("Not allowed: {0}")]
    Forbidden(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// User service
pub struct UserService {
    repo: Arc<dyn UserRepository>,
}

impl UserService {
    /// Create a new user service
    pub fn new(repo: Arc<dyn UserRepository>) -> Self {
        Self { repo }
    }

    /// Register a new account; starts unapproved
    pub async fn register(&self, input: CreateUserInput) -> Result<User, UserServiceError> {
        if input.name.trim().is_empty() {
            return Err(UserServiceError::Validation(
                "name must not be empty".to_string(),
            ));
        }
        if !input.email.contains('@') {
            return Err(UserServiceError::Validation(format!(
                "invalid email address: {}",
                input.email
            )));
        }

        if self.repo.get_by_email(&input.email).await?.is_some() {
            return Err(UserServiceError::Exists(input.email));
        }

        let user = User {
            id: Uuid::new_v4().to_string(),
            email: input.email,
            role: input.role.unwrap_or(UserRole::Operator),
            name: input.name.trim().to_string(),
            store: input.store,
            approved: false,
        };

        self.repo.create(&user).await?;
        Ok(user)
    }

    /// Get a user by id
    pub async fn get(&self, id: &str) -> Result<Option<User>, UserServiceError> {
        Ok(self.repo.get(id).await?)
    }

    /// List all users (admin only)
    pub async fn list(&self, acting_user: &User) -> Result<Vec<User>, UserServiceError> {
        if !acting_user.can_manage_users() {
            return Err(UserServiceError::Forbidden(
                "only admins may list users".to_string(),
            ));
        }
        Ok(self.repo.list().await?)
    }

    /// Set a user's approval flag (admin only)
    pub async fn set_approval(
        &self,
        id: &str,
        approved: bool,
        acting_user: &User,
    ) -> Result<(), UserServiceError> {
        if !acting_user.can_manage_users() {
            return Err(UserServiceError::Forbidden(
                "only admins may approve users".to_string(),
            ));
        }

        if self.repo.set_approved(id, approved).await? {
            Ok(())
        } else {
            Err(UserServiceError::NotFound(id.to_string()))
        }
    }

    /// Remove a user (admin only)
    pub async fn remove(&self, id: &str, acting_user: &User) -> Result<(), UserServiceError> {
        if !acting_user.can_manage_users() {
            return Err(UserServiceError::Forbidden(
                "only admins may remove users".to_string(),
            ));
        }

        if self.repo.delete(id).await? {
            Ok(())
        } else {
            Err(UserServiceError::NotFound(id.to_string()))
        }
    }
}
