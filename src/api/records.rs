//! Validity record endpoints
//!
//! Records are listed with their status derived at request time; status is
//! never stored, so a record that was fine yesterday reads as expired today
//! without any write having happened.

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    routing::get,
    Json, Router,
};
use chrono::{Local, NaiveDateTime};
use serde::Serialize;

use crate::models::{ExpiryStatus, ValidityRecord};
use crate::services::StatusPolicy;

use super::middleware::{acting_user, ApiError, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_records))
        .route("/{id}", axum::routing::delete(delete_record))
}

/// A record together with its status at view time
#[derive(Debug, Serialize)]
pub struct RecordView {
    #[serde(flatten)]
    pub record: ValidityRecord,
    pub status: ExpiryStatus,
}

impl RecordView {
    /// Pair a record with its status against `now`
    pub fn classify(record: ValidityRecord, now: NaiveDateTime, policy: &StatusPolicy) -> Self {
        let status = crate::services::classify_record(&record, now, policy);
        Self { record, status }
    }

    /// Classify a slice of records in order
    pub fn list(records: &[ValidityRecord], now: NaiveDateTime, policy: &StatusPolicy) -> Vec<Self> {
        records
            .iter()
            .map(|record| Self::classify(record.clone(), now, policy))
            .collect()
    }
}

/// GET /api/records
async fn list_records(
    State(state): State<AppState>,
) -> Result<Json<Vec<RecordView>>, ApiError> {
    let now = Local::now().naive_local();
    let listed = state.record_service.list_with_status(now, &state.policy).await?;
    Ok(Json(
        listed
            .into_iter()
            .map(|(record, status)| RecordView { record, status })
            .collect(),
    ))
}

/// DELETE /api/records/{id}
///
/// Admin only. A forbidden delete and a missing record answer differently
/// on purpose.
async fn delete_record(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<axum::http::StatusCode, ApiError> {
    let user = acting_user(&state, &headers).await?;
    state.record_service.delete(&id, &user).await?;

    // Drop the record from any in-flight session views as well
    let mut sessions = state.sessions.write().await;
    for session in sessions.values_mut() {
        session.aggregator.remove(&id);
    }

    Ok(axum::http::StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::spawn_server;
    use crate::db::repositories::RecordRepository;
    use crate::models::{Period, RecordedTime, ValidityRecord};
    use axum::http::{HeaderName, HeaderValue, StatusCode};
    use chrono::{Duration, Local};
    use serde_json::Value;

    fn record(id: &str, days_ahead: i64) -> ValidityRecord {
        ValidityRecord {
            id: id.to_string(),
            template_id: "t1".to_string(),
            product_name: "Milk".to_string(),
            image_url: String::new(),
            expiry_date: Local::now().date_naive() + Duration::days(days_ahead),
            recorded_time: RecordedTime::NotRecorded,
            period: Period::Opening,
            store: "Downtown".to_string(),
            created_by_id: "u1".to_string(),
            created_by_name: "Maria".to_string(),
        }
    }

    #[tokio::test]
    async fn test_list_derives_status_per_request() {
        let app = spawn_server().await;
        app.records.create(&record("past", -3)).await.unwrap();
        app.records.create(&record("future", 30)).await.unwrap();

        let response = app.server.get("/api/records").await;
        response.assert_status_ok();
        let body: Value = response.json();
        let records = body.as_array().unwrap();
        assert_eq!(records.len(), 2);

        // Repository orders by expiry date ascending
        assert_eq!(records[0]["id"], "past");
        assert_eq!(records[0]["status"], "expired");
        assert_eq!(records[1]["status"], "valid");
        // Flattened view carries the record fields directly
        assert_eq!(records[0]["product_name"], "Milk");
        assert_eq!(records[0]["recorded_time"], "no time");
    }

    #[tokio::test]
    async fn test_delete_requires_identified_admin() {
        let app = spawn_server().await;
        app.records.create(&record("r1", 2)).await.unwrap();

        // No acting user
        app.server
            .delete("/api/records/r1")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);

        // Non-admin
        let operator = app.seed_user("op@example.com", true).await;
        app.server
            .delete("/api/records/r1")
            .add_header(HeaderName::from_static("x-user-id"), HeaderValue::from_str(&operator.id).unwrap())
            .await
            .assert_status(StatusCode::FORBIDDEN);

        // Admin succeeds; the repeat is a 404
        let admin = app.seed_admin("admin@example.com").await;
        app.server
            .delete("/api/records/r1")
            .add_header(HeaderName::from_static("x-user-id"), HeaderValue::from_str(&admin.id).unwrap())
            .await
            .assert_status(StatusCode::NO_CONTENT);
        app.server
            .delete("/api/records/r1")
            .add_header(HeaderName::from_static("x-user-id"), HeaderValue::from_str(&admin.id).unwrap())
            .await
            .assert_status_not_found();
    }
}
