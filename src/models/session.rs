//! Session data model

use serde::{Deserialize, Serialize};

use super::Period;

/// Ephemeral data for one operator's check-run within one period.
///
/// Created when the operator confirms the period selection, discarded on
/// logout or task finish. Never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionData {
    /// Operator name as entered at session start
    pub operator_name: String,
    /// Active check period
    pub period: Period,
    /// Store the session runs in
    pub store: String,
    /// Comma-separated report recipients captured at session start.
    /// Optional on the wire; stateless report requests carry the
    /// recipients separately.
    #[serde(default)]
    pub report_email: String,
}
