//! Report composition
//!
//! Builds the transient report payload sent at the end of a session. The
//! report is a snapshot: counts and per-record statuses are frozen at
//! composition time so the recipient sees what was true when the operator
//! finished, even if delivery is delayed. It exists only for the duration
//! of a finalize-and-send flow and is never persisted.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::models::{ExpiryStatus, Period, RecordedTime, SessionData, ValidityRecord};
use crate::services::session::SessionCounts;
use crate::services::status::{classify_record, StatusPolicy};

/// Error types for report composition
#[derive(Debug, thiserror::Error)]
pub enum ComposeError {
    /// No usable recipient after parsing the address string
    #[error("No valid recipient address provided")]
    NoRecipient,
}

/// One itemized line of the report
#[derive(Debug, Clone, Serialize)]
pub struct ReportLine {
    /// Product name
    pub product_name: String,
    /// Expiry date formatted for display (dd/mm/yyyy)
    pub expiry: String,
    /// Status at composition time
    pub status: ExpiryStatus,
}

/// Composed session report, ready for dispatch
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// Parsed recipient addresses
    pub recipients: Vec<String>,
    /// Store the session ran in
    pub store: String,
    /// Check period of the session
    pub period: Period,
    /// Operator who ran the session
    pub operator_name: String,
    /// Composition instant
    pub generated_at: NaiveDateTime,
    /// Counts frozen at composition time
    pub counts: SessionCounts,
    /// Itemized records, in session order
    pub lines: Vec<ReportLine>,
}

impl Report {
    /// Email subject line for this report
    pub fn subject(&self) -> String {
        format!(
            "Expiry Report - {} - {}",
            self.store,
            self.period.to_string().to_uppercase()
        )
    }
}

/// Parse a comma-separated recipient string.
///
/// Entries are trimmed and empty ones dropped; `"a@x.com, ,b@y.com"`
/// yields two recipients.
pub fn parse_recipients(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(str::to_string)
        .collect()
}

/// Compose a report from a session snapshot.
///
/// Statuses are classified once, here, against the injected `now`; the
/// dispatcher must not re-derive them. Calling compose twice with the same
/// inputs yields identical counts and lines.
pub fn compose(
    session: &SessionData,
    records: &[ValidityRecord],
    recipients_raw: &str,
    now: NaiveDateTime,
    policy: &StatusPolicy,
) -> Result<Report, ComposeError> {
    let recipients = parse_recipients(recipients_raw);
    if recipients.is_empty() {
        return Err(ComposeError::NoRecipient);
    }

    let mut counts = SessionCounts {
        total: records.len(),
        expiring_soon: 0,
        expired: 0,
    };

    let lines = records
        .iter()
        .map(|record| {
            let status = classify_record(record, now, policy);
            match status {
                ExpiryStatus::ExpiringSoon => counts.expiring_soon += 1,
                ExpiryStatus::Expired => counts.expired += 1,
                ExpiryStatus::Valid => {}
            }

            let expiry = match record.recorded_time {
                RecordedTime::At(_) => format!(
                    "{} @ {}",
                    record.expiry_date.format("%d/%m/%Y"),
                    record.recorded_time
                ),
                RecordedTime::NotRecorded => record.expiry_date.format("%d/%m/%Y").to_string(),
            };

            ReportLine {
                product_name: record.product_name.clone(),
                expiry,
                status,
            }
        })
        .collect();

    Ok(Report {
        recipients,
        store: session.store.clone(),
        period: session.period,
        operator_name: session.operator_name.clone(),
        generated_at: now,
        counts,
        lines,
    })
}
