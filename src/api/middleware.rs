//! API middleware and shared state
//!
//! Contains the application state, the serialized API error envelope, and
//! acting-user resolution for authorization-gated routes.

use axum::{
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::FinalizeEmpty;
use crate::models::User;
use crate::services::{
    ComposeError, DispatchError, LifecycleError, RecordService, RecordServiceError,
    ReportDispatcher, StatusPolicy, TemplateService, TemplateServiceError, UserService,
    UserServiceError,
};

use super::sessions::OperatorSession;

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub record_service: Arc<RecordService>,
    pub template_service: Arc<TemplateService>,
    pub user_service: Arc<UserService>,
    pub dispatcher: Arc<ReportDispatcher>,
    /// Active operator sessions, keyed by session id. Held only in this
    /// process for the sessions' duration; nothing here is persisted.
    pub sessions: Arc<RwLock<HashMap<String, OperatorSession>>>,
    pub policy: StatusPolicy,
    pub finalize_empty: FinalizeEmpty,
}

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
            },
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHORIZED", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new("FORBIDDEN", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new("CONFLICT", message)
    }

    pub fn dispatch_error(message: impl Into<String>) -> Self {
        Self::new("DISPATCH_ERROR", message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.error.code.as_str() {
            "UNAUTHORIZED" => StatusCode::UNAUTHORIZED,
            "FORBIDDEN" => StatusCode::FORBIDDEN,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" | "NO_RECIPIENT" => StatusCode::BAD_REQUEST,
            "CONFLICT" => StatusCode::CONFLICT,
            "DISPATCH_ERROR" => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(self)).into_response()
    }
}

impl From<RecordServiceError> for ApiError {
    fn from(e: RecordServiceError) -> Self {
        match e {
            RecordServiceError::Validation(m) => Self::validation_error(m),
            RecordServiceError::NotFound(id) => Self::not_found(format!("record {}", id)),
            RecordServiceError::Forbidden(m) => Self::forbidden(m),
            RecordServiceError::Internal(e) => Self::internal_error(e.to_string()),
        }
    }
}

impl From<TemplateServiceError> for ApiError {
    fn from(e: TemplateServiceError) -> Self {
        match e {
            TemplateServiceError::Validation(m) => Self::validation_error(m),
            TemplateServiceError::NotFound(id) => Self::not_found(format!("template {}", id)),
            TemplateServiceError::Forbidden(m) => Self::forbidden(m),
            TemplateServiceError::Internal(e) => Self::internal_error(e.to_string()),
        }
    }
}

impl From<UserServiceError> for ApiError {
    fn from(e: UserServiceError) -> Self {
        match e {
            UserServiceError::Validation(m) => Self::validation_error(m),
            UserServiceError::Exists(email) => {
                Self::conflict(format!("user already exists: {}", email))
            }
            UserServiceError::NotFound(id) => Self::not_found(format!("user {}", id)),
            UserServiceError::Forbidden(m) => Self::forbidden(m),
            UserServiceError::Internal(e) => Self::internal_error(e.to_string()),
        }
    }
}

impl From<LifecycleError> for ApiError {
    fn from(e: LifecycleError) -> Self {
        match e {
            LifecycleError::InvalidStart(m) => Self::validation_error(m),
            LifecycleError::InvalidTransition { .. } => Self::conflict(e.to_string()),
        }
    }
}

impl From<ComposeError> for ApiError {
    fn from(e: ComposeError) -> Self {
        Self::new("NO_RECIPIENT", e.to_string())
    }
}

impl From<DispatchError> for ApiError {
    fn from(e: DispatchError) -> Self {
        // Email failure is non-fatal to data integrity; tell the operator
        // their records survived and a retry is fine.
        Self::dispatch_error(format!(
            "{}. The session records are already saved; you may retry sending the report.",
            e
        ))
    }
}

/// Resolve the acting user for authorization-gated routes.
///
/// The acting user is identified by the `X-User-Id` header; full
/// authentication is out of scope, role checks are not.
pub async fn acting_user(state: &AppState, headers: &HeaderMap) -> Result<User, ApiError> {
    let id = headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::unauthorized("Missing X-User-Id header"))?;

    state
        .user_service
        .get(id)
        .await?
        .ok_or_else(|| ApiError::unauthorized(format!("Unknown user: {}", id)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_map_to_statuses() {
        let cases = [
            (ApiError::unauthorized("x"), StatusCode::UNAUTHORIZED),
            (ApiError::forbidden("x"), StatusCode::FORBIDDEN),
            (ApiError::not_found("x"), StatusCode::NOT_FOUND),
            (ApiError::validation_error("x"), StatusCode::BAD_REQUEST),
            (ApiError::conflict("x"), StatusCode::CONFLICT),
            (ApiError::dispatch_error("x"), StatusCode::BAD_GATEWAY),
            (ApiError::internal_error("x"), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }

    #[test]
    fn test_forbidden_delete_is_not_a_not_found() {
        let forbidden: ApiError = RecordServiceError::Forbidden("no".to_string()).into();
        let missing: ApiError = RecordServiceError::NotFound("r1".to_string()).into();
        assert_ne!(
            forbidden.into_response().status(),
            missing.into_response().status()
        );
    }

    #[test]
    fn test_dispatch_error_mentions_saved_records() {
        let error: ApiError = DispatchError::Provider("rejected".to_string()).into();
        assert!(error.error.message.contains("rejected"));
        assert!(error.error.message.contains("already saved"));
    }
}
