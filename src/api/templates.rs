//! Product catalog endpoints

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::models::{CreateTemplateInput, Period, ProductTemplate};

use super::middleware::{acting_user, ApiError, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_templates).post(create_template))
        .route("/{id}", axum::routing::delete(delete_template))
}

#[derive(Debug, Deserialize)]
struct ListTemplatesQuery {
    /// Restrict the catalog to templates applicable to this period
    period: Option<Period>,
}

/// GET /api/templates[?period=opening]
async fn list_templates(
    State(state): State<AppState>,
    Query(query): Query<ListTemplatesQuery>,
) -> Json<Vec<ProductTemplate>> {
    let templates = match query.period {
        Some(period) => state.template_service.list_for_period(period).await,
        None => state.template_service.list().await,
    };
    Json(templates)
}

/// POST /api/templates (admin only)
async fn create_template(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<CreateTemplateInput>,
) -> Result<Json<ProductTemplate>, ApiError> {
    let user = acting_user(&state, &headers).await?;
    let template = state.template_service.create(input, &user).await?;
    Ok(Json(template))
}

/// DELETE /api/templates/{id} (admin only)
async fn delete_template(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<axum::http::StatusCode, ApiError> {
    let user = acting_user(&state, &headers).await?;
    state.template_service.delete(&id, &user).await?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}
