//! User model
//!
//! This module defines the User entity and the capability predicates the
//! services use for authorization. All role checks go through these
//! predicates so UI-level and service-level enforcement cannot drift.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A registered user of the system.
///
/// Users carry a role and an approval flag; unapproved users cannot start
/// a working session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: String,
    /// Email address (unique)
    pub email: String,
    /// User role
    pub role: UserRole,
    /// Display name
    pub name: String,
    /// Store the user belongs to
    pub store: String,
    /// Whether an admin has approved this account
    pub approved: bool,
}

impl User {
    /// Check if the user is an administrator
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Whether the user may delete validity records
    pub fn can_delete_records(&self) -> bool {
        self.is_admin()
    }

    /// Whether the user may approve, modify or remove other users
    pub fn can_manage_users(&self) -> bool {
        self.is_admin()
    }

    /// Whether the user may create or delete catalog templates
    pub fn can_manage_templates(&self) -> bool {
        self.is_admin()
    }

    /// Whether the user may view records across the whole store
    pub fn can_view_all_records(&self) -> bool {
        matches!(self.role, UserRole::Admin | UserRole::Manager)
    }

    /// Whether the user may start a working session
    pub fn can_start_session(&self) -> bool {
        self.approved
    }
}

/// User role for authorization.
///
/// - Admin: full access, including deletes and user approval
/// - Manager: aggregated/reporting views
/// - Operator: runs check sessions and registers records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Administrator - full access
    Admin,
    /// Manager - aggregated views
    Manager,
    /// Operator - runs check sessions
    #[default]
    Operator,
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::Admin => write!(f, "admin"),
            UserRole::Manager => write!(f, "manager"),
            UserRole::Operator => write!(f, "operator"),
        }
    }
}

impl FromStr for UserRole {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(UserRole::Admin),
            "manager" => Ok(UserRole::Manager),
            "operator" => Ok(UserRole::Operator),
            _ => Err(anyhow::anyhow!("Invalid user role: {}", s)),
        }
    }
}

/// Input for registering a new user.
///
/// New accounts start unapproved; an admin flips the flag.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserInput {
    /// Email address
    pub email: String,
    /// Display name
    pub name: String,
    /// Store the user belongs to
    pub store: String,
    /// Role (optional, defaults to Operator)
    #[serde(default)]
    pub role: Option<UserRole>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: UserRole, approved: bool) -> User {
        User {
            id: "u1".to_string(),
            email: "user@example.com".to_string(),
            role,
            name: "Test User".to_string(),
            store: "Downtown".to_string(),
            approved,
        }
    }

    #[test]
    fn test_only_admin_can_delete_records() {
        assert!(user(UserRole::Admin, true).can_delete_records());
        assert!(!user(UserRole::Manager, true).can_delete_records());
        assert!(!user(UserRole::Operator, true).can_delete_records());
    }

    #[test]
    fn test_only_admin_can_manage_users() {
        assert!(user(UserRole::Admin, true).can_manage_users());
        assert!(!user(UserRole::Manager, true).can_manage_users());
        assert!(!user(UserRole::Operator, true).can_manage_users());
    }

    #[test]
    fn test_managers_and_admins_view_all_records() {
        assert!(user(UserRole::Admin, true).can_view_all_records());
        assert!(user(UserRole::Manager, true).can_view_all_records());
        assert!(!user(UserRole::Operator, true).can_view_all_records());
    }

    #[test]
    fn test_approval_gates_session_start() {
        assert!(user(UserRole::Operator, true).can_start_session());
        assert!(!user(UserRole::Operator, false).can_start_session());
        assert!(!user(UserRole::Admin, false).can_start_session());
    }

    #[test]
    fn test_role_display_round_trip() {
        for role in [UserRole::Admin, UserRole::Manager, UserRole::Operator] {
            assert_eq!(UserRole::from_str(&role.to_string()).unwrap(), role);
        }
        assert!(UserRole::from_str("supervisor").is_err());
    }
}
