//! Stateless report endpoint
//!
//! One-shot compose-and-send over a payload the client supplies in full.
//! Kiosk clients that keep session state locally use this instead of the
//! server-side session flow.

use axum::{extract::State, Json};
use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::models::{SessionData, ValidityRecord};
use crate::services::report::compose;

use super::middleware::{ApiError, AppState};

/// Request payload for a one-shot report send
#[derive(Debug, Deserialize)]
pub struct SendReportRequest {
    /// Comma-separated recipient addresses
    pub email: Option<String>,
    /// Session the records were registered under
    pub session: Option<SessionData>,
    /// Records to report on
    pub records: Option<Vec<ValidityRecord>>,
}

/// Response payload for a successful send
#[derive(Debug, Serialize)]
pub struct SendReportResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// POST /api/send-report
///
/// Missing fields are a validation error, not a deserialization failure,
/// so clients get the structured error envelope.
pub async fn send_report(
    State(state): State<AppState>,
    Json(request): Json<SendReportRequest>,
) -> Result<Json<SendReportResponse>, ApiError> {
    let email = request
        .email
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| ApiError::validation_error("Missing report recipient"))?;
    let session = request
        .session
        .ok_or_else(|| ApiError::validation_error("Missing session data"))?;
    let records = request
        .records
        .ok_or_else(|| ApiError::validation_error("Missing records"))?;

    let now = Local::now().naive_local();
    let report = compose(&session, &records, &email, now, &state.policy)?;
    let result = state.dispatcher.dispatch(&report).await?;

    Ok(Json(SendReportResponse {
        success: true,
        message: result.message,
    }))
}
