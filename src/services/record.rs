//! Record service
//!
//! Business logic for validity records: input validation, template
//! snapshotting, persistence delegation and the admin-gated delete. Every
//! read path re-derives the expiry status against an injected "now".

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::repositories::{RecordRepository, TemplateRepository};
use crate::models::{ExpiryStatus, RecordedTime, SessionData, User, ValidityRecord};
use crate::services::status::{classify_record, StatusPolicy};

/// Error types for record operations
#[derive(Debug, thiserror::Error)]
pub enum RecordServiceError {
    /// Required input missing or malformed; recovered locally, blocks
    /// submission
    #[error("Validation error: {0}")]
    Validation(String),

    /// Record does not exist
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Acting user lacks the required capability. Deliberately distinct
    /// from `NotFound` so a rejected delete can never be mistaken for a
    /// missing record.
    #[error("Not allowed: {0}")]
    Forbidden(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Raw input for registering a record.
///
/// Fields mirror the operator form: a template pick, an expiry date, and
/// either a time or the explicit no-time tick.
#[derive(Debug, Clone, Deserialize)]
pub struct NewRecordInput {
    /// Selected template id
    pub template_id: Option<String>,
    /// Expiry date read off the product
    pub expiry_date: Option<NaiveDate>,
    /// Expiry time-of-day ("HH:MM"), required unless `no_time` is set
    #[serde(default)]
    pub time: Option<String>,
    /// Operator explicitly ticked "no time"
    #[serde(default)]
    pub no_time: bool,
}

/// Record service
pub struct RecordService {
    records: Arc<dyn RecordRepository>,
    templates: Arc<dyn TemplateRepository>,
}

impl RecordService {
    /// Create a new record service
    pub fn new(
        records: Arc<dyn RecordRepository>,
        templates: Arc<dyn TemplateRepository>,
    ) -> Self {
        Self { records, templates }
    }

    /// Validate input, snapshot the template, and persist a new record.
    ///
    /// Required: a template that exists, an expiry date, and either a
    /// parseable time or the explicit no-time flag. The product name and
    /// image are copied off the template so later catalog edits or
    /// deletions never rewrite history.
    pub async fn register(
        &self,
        session: &SessionData,
        created_by_id: &str,
        input: NewRecordInput,
    ) -> Result<ValidityRecord, RecordServiceError> {
        let template_id = input
            .template_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| RecordServiceError::Validation("no product selected".to_string()))?;

        let expiry_date = input
            .expiry_date
            .ok_or_else(|| RecordServiceError::Validation("expiry date is required".to_string()))?;

        let recorded_time = if input.no_time {
            RecordedTime::NotRecorded
        } else {
            let raw = input.time.as_deref().filter(|t| !t.trim().is_empty()).ok_or_else(|| {
                RecordServiceError::Validation(
                    "a time is required unless 'no time' is set".to_string(),
                )
            })?;
            RecordedTime::from_str(raw)
                .map_err(|e| RecordServiceError::Validation(e.to_string()))?
        };

        let template = self
            .templates
            .get(template_id)
            .await?
            .ok_or_else(|| {
                RecordServiceError::Validation(format!("unknown template: {}", template_id))
            })?;

        let record = ValidityRecord {
            id: Uuid::new_v4().to_string(),
            template_id: template.id.clone(),
            product_name: template.name.clone(),
            image_url: template.image_url.clone(),
            expiry_date,
            recorded_time,
            period: session.period,
            store: session.store.clone(),
            created_by_id: created_by_id.to_string(),
            created_by_name: session.operator_name.clone(),
        };

        self.records.create(&record).await?;
        Ok(record)
    }

    /// All records with their status derived against `now`
    pub async fn list_with_status(
        &self,
        now: NaiveDateTime,
        policy: &StatusPolicy,
    ) -> Result<Vec<(ValidityRecord, ExpiryStatus)>, RecordServiceError> {
        let records = self.records.list().await?;
        Ok(records
            .into_iter()
            .map(|record| {
                let status = classify_record(&record, now, policy);
                (record, status)
            })
            .collect())
    }

    /// Delete a record on behalf of `acting_user`.
    ///
    /// The capability check runs before persistence is touched: a
    /// non-admin gets `Forbidden`, a missing record gets `NotFound`.
    pub async fn delete(
        &self,
        id: &str,
        acting_user: &User,
    ) -> Result<(), RecordServiceError> {
        if !acting_user.can_delete_records() {
            return Err(RecordServiceError::Forbidden(
                "only admins may delete records".to_string(),
            ));
        }

        if self.records.delete(id).await? {
            Ok(())
        } else {
            Err(RecordServiceError::NotFound(id.to_string()))
        }
    }
}
