//! Account endpoints
//!
//! Registration is open; everything else is gated on an admin acting user.
//! New accounts start unapproved and cannot start sessions until approved.

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;

use crate::models::{CreateUserInput, User};

use super::middleware::{acting_user, ApiError, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(register_user))
        .route("/{id}", axum::routing::delete(delete_user))
        .route("/{id}/approval", put(set_approval))
}

/// POST /api/users
async fn register_user(
    State(state): State<AppState>,
    Json(input): Json<CreateUserInput>,
) -> Result<Json<User>, ApiError> {
    let user = state.user_service.register(input).await?;
    tracing::info!(user_id = %user.id, email = %user.email, "Account registered, pending approval");
    Ok(Json(user))
}

/// GET /api/users (admin only)
async fn list_users(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<User>>, ApiError> {
    let user = acting_user(&state, &headers).await?;
    Ok(Json(state.user_service.list(&user).await?))
}

#[derive(Debug, Deserialize)]
struct ApprovalRequest {
    approved: bool,
}

/// PUT /api/users/{id}/approval (admin only)
async fn set_approval(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<ApprovalRequest>,
) -> Result<axum::http::StatusCode, ApiError> {
    let user = acting_user(&state, &headers).await?;
    state
        .user_service
        .set_approval(&id, request.approved, &user)
        .await?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}

/// DELETE /api/users/{id} (admin only)
async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<axum::http::StatusCode, ApiError> {
    let user = acting_user(&state, &headers).await?;
    state.user_service.remove(&id, &user).await?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}
