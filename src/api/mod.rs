//! API layer - HTTP handlers and routing
//!
//! This module contains all HTTP API endpoints for the ShelfCheck service:
//! - Stateless report send endpoint
//! - Working-session endpoints
//! - Record endpoints
//! - Product catalog endpoints
//! - Account endpoints

pub mod middleware;
pub mod records;
pub mod report;
pub mod sessions;
pub mod templates;
pub mod users;

use axum::{
    http::{header, HeaderValue, Method},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use middleware::{ApiError, AppState};

/// Build the main API router
pub fn build_api_router() -> Router<AppState> {
    Router::new()
        .route("/send-report", axum::routing::post(report::send_report))
        .nest("/sessions", sessions::router())
        .nest("/records", records::router())
        .nest("/templates", templates::router())
        .nest("/users", users::router())
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(cors_origin.parse::<HeaderValue>().unwrap())
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::HeaderName::from_static("x-user-id")]);

    Router::new()
        .nest("/api", build_api_router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
