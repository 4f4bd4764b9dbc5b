//! Working-session endpoints
//!
//! A working session is held in process memory for its whole life: started,
//! fed records, finalized, reported on, terminated. Records themselves are
//! persisted the moment they are registered; only the session bookkeeping
//! (lifecycle state, session-local record list) lives here.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Local;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Period, SessionData};
use crate::services::{
    compose, FinalizeDecision, NewRecordInput, SessionAggregator, SessionCounts,
    SessionLifecycle, SessionState,
};

use super::middleware::{ApiError, AppState};
use super::records::RecordView;

/// One operator's in-flight session
pub struct OperatorSession {
    pub lifecycle: SessionLifecycle,
    pub aggregator: SessionAggregator,
    /// Id of the account that started the session; empty for anonymous
    /// demo sessions
    pub created_by_id: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(start_session))
        .route("/{id}", get(get_session).delete(terminate_session))
        .route("/{id}/records", post(add_record))
        .route("/{id}/finalize", post(finalize_session))
        .route("/{id}/resume", post(resume_session))
        .route("/{id}/send", post(send_session_report))
}

#[derive(Debug, Deserialize)]
pub struct StartSessionRequest {
    pub operator_name: String,
    pub period: Period,
    pub store: String,
    #[serde(default)]
    pub report_email: String,
    /// Account starting the session; omit for anonymous demo use
    #[serde(default)]
    pub operator_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionStartedResponse {
    pub session_id: String,
    pub state: SessionState,
}

/// POST /api/sessions
async fn start_session(
    State(state): State<AppState>,
    Json(request): Json<StartSessionRequest>,
) -> Result<Json<SessionStartedResponse>, ApiError> {
    let created_by_id = match &request.operator_id {
        Some(id) => {
            let user = state
                .user_service
                .get(id)
                .await?
                .ok_or_else(|| ApiError::unauthorized(format!("Unknown user: {}", id)))?;
            if !user.can_start_session() {
                return Err(ApiError::forbidden(
                    "Account is pending approval by an administrator",
                ));
            }
            user.id
        }
        None => String::new(),
    };

    let session = SessionData {
        operator_name: request.operator_name,
        period: request.period,
        store: request.store,
        report_email: request.report_email,
    };

    let lifecycle = SessionLifecycle::start(&session)?;
    let session_id = Uuid::new_v4().to_string();

    tracing::info!(
        session_id = %session_id,
        operator = %session.operator_name,
        period = %session.period,
        store = %session.store,
        "Session started"
    );

    let response = SessionStartedResponse {
        session_id: session_id.clone(),
        state: lifecycle.state(),
    };
    state.sessions.write().await.insert(
        session_id,
        OperatorSession {
            lifecycle,
            aggregator: SessionAggregator::new(session),
            created_by_id,
        },
    );

    Ok(Json(response))
}

#[derive(Debug, Serialize)]
pub struct SessionDetailResponse {
    pub session_id: String,
    pub state: SessionState,
    pub session: SessionData,
    pub counts: SessionCounts,
    pub records: Vec<RecordView>,
}

/// GET /api/sessions/{id}
async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionDetailResponse>, ApiError> {
    let sessions = state.sessions.read().await;
    let session = sessions
        .get(&id)
        .ok_or_else(|| ApiError::not_found(format!("session {}", id)))?;

    let now = Local::now().naive_local();
    Ok(Json(SessionDetailResponse {
        session_id: id,
        state: session.lifecycle.state(),
        session: session.aggregator.session().clone(),
        counts: session.aggregator.counts(now, &state.policy),
        records: RecordView::list(session.aggregator.records(), now, &state.policy),
    }))
}

#[derive(Debug, Serialize)]
pub struct AddRecordResponse {
    pub record: RecordView,
    pub counts: SessionCounts,
}

/// POST /api/sessions/{id}/records
///
/// The record is persisted first, then mirrored into the session-local
/// list. A dispatch failure later in the session can therefore never lose
/// it.
async fn add_record(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<NewRecordInput>,
) -> Result<Json<AddRecordResponse>, ApiError> {
    // Validate the session state before touching persistence, without
    // holding the lock across the repository call.
    let (session_data, created_by_id) = {
        let sessions = state.sessions.read().await;
        let session = sessions
            .get(&id)
            .ok_or_else(|| ApiError::not_found(format!("session {}", id)))?;
        session.lifecycle.record_added()?;
        (
            session.aggregator.session().clone(),
            session.created_by_id.clone(),
        )
    };

    let record = state
        .record_service
        .register(&session_data, &created_by_id, input)
        .await?;

    let mut sessions = state.sessions.write().await;
    let session = sessions
        .get_mut(&id)
        .ok_or_else(|| ApiError::not_found(format!("session {}", id)))?;
    session.lifecycle.record_added()?;
    session.aggregator.insert(record.clone());

    let now = Local::now().naive_local();
    Ok(Json(AddRecordResponse {
        record: RecordView::classify(record, now, &state.policy),
        counts: session.aggregator.counts(now, &state.policy),
    }))
}

#[derive(Debug, Serialize)]
pub struct FinalizeResponse {
    pub state: SessionState,
    pub report_pending: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counts: Option<SessionCounts>,
}

/// POST /api/sessions/{id}/finalize
async fn finalize_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<FinalizeResponse>, ApiError> {
    let mut sessions = state.sessions.write().await;
    let session = sessions
        .get_mut(&id)
        .ok_or_else(|| ApiError::not_found(format!("session {}", id)))?;

    match session
        .lifecycle
        .begin_finalize(session.aggregator.len(), state.finalize_empty)?
    {
        FinalizeDecision::SkippedEmpty => {
            sessions.remove(&id);
            tracing::info!(session_id = %id, "Empty session finalized without report");
            Ok(Json(FinalizeResponse {
                state: SessionState::Terminated,
                report_pending: false,
                counts: None,
            }))
        }
        FinalizeDecision::ReportPending => {
            let now = Local::now().naive_local();
            Ok(Json(FinalizeResponse {
                state: SessionState::Finalizing,
                report_pending: true,
                counts: Some(session.aggregator.counts(now, &state.policy)),
            }))
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SessionStateResponse {
    pub state: SessionState,
}

/// POST /api/sessions/{id}/resume
async fn resume_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionStateResponse>, ApiError> {
    let mut sessions = state.sessions.write().await;
    let session = sessions
        .get_mut(&id)
        .ok_or_else(|| ApiError::not_found(format!("session {}", id)))?;

    session.lifecycle.cancel_finalize()?;
    Ok(Json(SessionStateResponse {
        state: session.lifecycle.state(),
    }))
}

#[derive(Debug, Serialize)]
pub struct SendSessionReportResponse {
    pub success: bool,
    pub counts: SessionCounts,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// POST /api/sessions/{id}/send
///
/// Only a finalizing session may dispatch. On provider failure the session
/// stays in Finalizing so the operator can retry; on success it is
/// terminated and dropped.
async fn send_session_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SendSessionReportResponse>, ApiError> {
    let (session_data, records) = {
        let sessions = state.sessions.read().await;
        let session = sessions
            .get(&id)
            .ok_or_else(|| ApiError::not_found(format!("session {}", id)))?;
        if !session.lifecycle.can_dispatch() {
            return Err(ApiError::conflict(
                "Finalize the session before sending the report",
            ));
        }
        (
            session.aggregator.session().clone(),
            session.aggregator.records().to_vec(),
        )
    };

    let now = Local::now().naive_local();
    let report = compose(
        &session_data,
        &records,
        &session_data.report_email,
        now,
        &state.policy,
    )?;
    let result = state.dispatcher.dispatch(&report).await?;

    // Dispatch succeeded; the session's work is done.
    state.sessions.write().await.remove(&id);
    tracing::info!(
        session_id = %id,
        records = report.counts.total,
        "Session report sent, session terminated"
    );

    Ok(Json(SendSessionReportResponse {
        success: true,
        counts: report.counts,
        message: result.message,
    }))
}

/// DELETE /api/sessions/{id}
async fn terminate_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let removed = state.sessions.write().await.remove(&id);
    if removed.is_none() {
        return Err(ApiError::not_found(format!("session {}", id)));
    }
    tracing::info!(session_id = %id, "Session terminated");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::{spawn_server, TestApp};
    use crate::db::repositories::{RecordRepository, TemplateRepository};
    use crate::models::{Period, ProductGroup, ProductTemplate};
    use axum::http::StatusCode;
    use chrono::{Duration, Local};
    use serde_json::{json, Value};

    async fn seed_template(app: &TestApp) {
        app.templates
            .create(&ProductTemplate {
                id: "t1".to_string(),
                name: "Milk".to_string(),
                image_url: "milk.jpg".to_string(),
                shelf_life_days: 5,
                periods: vec![Period::Opening, Period::Closing],
                group: ProductGroup::Fresh,
            })
            .await
            .unwrap();
    }

    async fn start(app: &TestApp) -> String {
        let response = app
            .server
            .post("/api/sessions")
            .json(&json!({
                "operator_name": "Maria",
                "period": "closing",
                "store": "Downtown",
                "report_email": "manager@example.com"
            }))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["state"], "active");
        body["session_id"].as_str().unwrap().to_string()
    }

    async fn add_record(app: &TestApp, session_id: &str, days_ahead: i64) -> Value {
        let expiry = (Local::now().date_naive() + Duration::days(days_ahead))
            .format("%Y-%m-%d")
            .to_string();
        let response = app
            .server
            .post(&format!("/api/sessions/{}/records", session_id))
            .json(&json!({
                "template_id": "t1",
                "expiry_date": expiry,
                "no_time": true
            }))
            .await;
        response.assert_status_ok();
        response.json()
    }

    #[tokio::test]
    async fn test_start_rejects_blank_operator_name() {
        let app = spawn_server().await;
        let response = app
            .server
            .post("/api/sessions")
            .json(&json!({
                "operator_name": "   ",
                "period": "opening",
                "store": "Downtown"
            }))
            .await;
        response.assert_status_bad_request();
        let body: Value = response.json();
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_start_rejects_unknown_and_unapproved_operators() {
        let app = spawn_server().await;

        let response = app
            .server
            .post("/api/sessions")
            .json(&json!({
                "operator_name": "Maria",
                "period": "opening",
                "store": "Downtown",
                "operator_id": "ghost"
            }))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);

        let pending = app.seed_user("pending@example.com", false).await;
        let response = app
            .server
            .post("/api/sessions")
            .json(&json!({
                "operator_name": "Maria",
                "period": "opening",
                "store": "Downtown",
                "operator_id": pending.id
            }))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_record_flow_updates_counts_most_recent_first() {
        let app = spawn_server().await;
        seed_template(&app).await;
        let session_id = start(&app).await;

        add_record(&app, &session_id, -1).await;
        let second = add_record(&app, &session_id, 30).await;

        assert_eq!(second["counts"]["total"], 2);
        assert_eq!(second["counts"]["expired"], 1);

        let response = app
            .server
            .get(&format!("/api/sessions/{}", session_id))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["state"], "active");
        assert_eq!(body["records"].as_array().unwrap().len(), 2);
        // Most recent first: the 30-days-ahead record leads the list
        assert_eq!(body["records"][0]["status"], "valid");
        assert_eq!(body["records"][1]["status"], "expired");
    }

    #[tokio::test]
    async fn test_finalize_empty_session_skips_report() {
        let app = spawn_server().await;
        let session_id = start(&app).await;

        let response = app
            .server
            .post(&format!("/api/sessions/{}/finalize", session_id))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["state"], "terminated");
        assert_eq!(body["report_pending"], false);

        // The skipped session is gone
        app.server
            .get(&format!("/api/sessions/{}", session_id))
            .await
            .assert_status_not_found();
    }

    #[tokio::test]
    async fn test_finalize_blocks_adds_and_resume_reopens() {
        let app = spawn_server().await;
        seed_template(&app).await;
        let session_id = start(&app).await;
        add_record(&app, &session_id, 2).await;

        let response = app
            .server
            .post(&format!("/api/sessions/{}/finalize", session_id))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["state"], "finalizing");
        assert_eq!(body["report_pending"], true);

        let expiry = Local::now().date_naive().format("%Y-%m-%d").to_string();
        app.server
            .post(&format!("/api/sessions/{}/records", session_id))
            .json(&json!({ "template_id": "t1", "expiry_date": expiry, "no_time": true }))
            .await
            .assert_status(StatusCode::CONFLICT);

        app.server
            .post(&format!("/api/sessions/{}/resume", session_id))
            .await
            .assert_status_ok();
        add_record(&app, &session_id, 2).await;
    }

    #[tokio::test]
    async fn test_send_requires_finalize_first() {
        let app = spawn_server().await;
        seed_template(&app).await;
        let session_id = start(&app).await;
        add_record(&app, &session_id, 2).await;

        app.server
            .post(&format!("/api/sessions/{}/send", session_id))
            .await
            .assert_status(StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_send_terminates_session_on_success() {
        let app = spawn_server().await;
        seed_template(&app).await;
        let session_id = start(&app).await;
        add_record(&app, &session_id, -1).await;

        app.server
            .post(&format!("/api/sessions/{}/finalize", session_id))
            .await
            .assert_status_ok();

        let response = app
            .server
            .post(&format!("/api/sessions/{}/send", session_id))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["success"], true);
        assert_eq!(body["counts"]["total"], 1);
        assert_eq!(body["counts"]["expired"], 1);
        assert!(body["message"].as_str().unwrap().contains("Test mode"));

        app.server
            .get(&format!("/api/sessions/{}", session_id))
            .await
            .assert_status_not_found();
    }

    #[tokio::test]
    async fn test_failed_send_keeps_session_and_records() {
        let app =
            crate::api::test_support::spawn_server_with_failing_transport("relay down").await;
        seed_template(&app).await;
        let session_id = start(&app).await;
        add_record(&app, &session_id, 2).await;

        app.server
            .post(&format!("/api/sessions/{}/finalize", session_id))
            .await
            .assert_status_ok();

        let response = app
            .server
            .post(&format!("/api/sessions/{}/send", session_id))
            .await;
        response.assert_status(StatusCode::BAD_GATEWAY);
        let body: Value = response.json();
        assert_eq!(body["error"]["code"], "DISPATCH_ERROR");
        assert!(body["error"]["message"].as_str().unwrap().contains("relay down"));

        // Session survives in finalizing state for a retry
        let response = app
            .server
            .get(&format!("/api/sessions/{}", session_id))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["state"], "finalizing");

        // And the record was persisted regardless
        let records = app.records.list().await.unwrap();
        assert_eq!(records.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_terminates_and_404s_after() {
        let app = spawn_server().await;
        let session_id = start(&app).await;

        app.server
            .delete(&format!("/api/sessions/{}", session_id))
            .await
            .assert_status(StatusCode::NO_CONTENT);
        app.server
            .delete(&format!("/api/sessions/{}", session_id))
            .await
            .assert_status_not_found();
    }
}
