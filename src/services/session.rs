//! Session aggregation and lifecycle
//!
//! A working session is the unit of one operator's check-run within one
//! period. Two components live here:
//!
//! - `SessionAggregator` keeps the records registered during the session
//!   (most recent first) and derives counts by classifying the live list.
//!   Counts are never incremented alongside inserts: a record's status can
//!   change between insertion and query (e.g. across midnight), so the only
//!   count that cannot drift is one computed from the list itself.
//! - `SessionLifecycle` is the state machine gating the flow from session
//!   start through finalize to termination. Dispatching a report is not
//!   idempotent, so the lifecycle is what prevents duplicate sends.

use serde::Serialize;
use std::fmt;

use crate::config::FinalizeEmpty;
use crate::models::{ExpiryStatus, SessionData, ValidityRecord};
use crate::services::status::{classify_record, StatusPolicy};
use chrono::NaiveDateTime;

/// Counts of session records by derived status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionCounts {
    /// Total records registered
    pub total: usize,
    /// Records classified expiring soon
    pub expiring_soon: usize,
    /// Records classified expired
    pub expired: usize,
}

/// Accumulates the records registered during one session
#[derive(Debug, Clone)]
pub struct SessionAggregator {
    session: SessionData,
    records: Vec<ValidityRecord>,
}

impl SessionAggregator {
    /// Create an empty aggregator for the given session
    pub fn new(session: SessionData) -> Self {
        Self {
            session,
            records: Vec::new(),
        }
    }

    /// The session this aggregator belongs to
    pub fn session(&self) -> &SessionData {
        &self.session
    }

    /// Records registered so far, most recent first
    pub fn records(&self) -> &[ValidityRecord] {
        &self.records
    }

    /// Number of records registered so far
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no records have been registered yet
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Add an already-persisted record to the front of the list
    pub fn insert(&mut self, record: ValidityRecord) {
        self.records.insert(0, record);
    }

    /// Remove a record from the local list.
    ///
    /// Returns whether the record was present. The caller is responsible
    /// for the authorization check and for signalling persistence; this
    /// component only maintains the session-local view.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.records.len();
        self.records.retain(|r| r.id != id);
        self.records.len() != before
    }

    /// Counts by status, classified against the given instant.
    ///
    /// Computed by filtering the live list so `total` always equals the
    /// number of records, whatever their statuses drifted to.
    pub fn counts(&self, now: NaiveDateTime, policy: &StatusPolicy) -> SessionCounts {
        let mut counts = SessionCounts {
            total: self.records.len(),
            expiring_soon: 0,
            expired: 0,
        };
        for record in &self.records {
            match classify_record(record, now, policy) {
                ExpiryStatus::ExpiringSoon => counts.expiring_soon += 1,
                ExpiryStatus::Expired => counts.expired += 1,
                ExpiryStatus::Valid => {}
            }
        }
        counts
    }
}

/// Lifecycle state of a working session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// Session running, records may be added
    Active,
    /// Finalize intent raised, awaiting send or cancel
    Finalizing,
    /// Session finished, no further operations accepted
    Terminated,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Active => write!(f, "active"),
            SessionState::Finalizing => write!(f, "finalizing"),
            SessionState::Terminated => write!(f, "terminated"),
        }
    }
}

/// Outcome of a finalize intent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalizeDecision {
    /// Session is finalizing; a report is expected before termination
    ReportPending,
    /// Session held no records and the policy skips empty reports;
    /// terminated immediately
    SkippedEmpty,
}

/// Error types for session lifecycle operations
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    /// Session start rejected (e.g. empty operator name)
    #[error("Cannot start session: {0}")]
    InvalidStart(String),

    /// Operation not allowed in the current state
    #[error("Cannot {action} while session is {state}")]
    InvalidTransition {
        /// State the session was in
        state: SessionState,
        /// Attempted action
        action: &'static str,
    },
}

/// State machine governing one session's start-to-termination flow.
///
/// Transitions:
/// - start: (no session) -> Active, requires a non-empty operator name
/// - record_added: Active -> Active
/// - begin_finalize: Active -> Finalizing (or straight to Terminated when
///   empty and the policy is skip)
/// - cancel_finalize: Finalizing -> Active, no data loss
/// - terminate: Active or Finalizing -> Terminated
///
/// Lifecycle state lives only in the running process; nothing here is
/// persisted.
#[derive(Debug, Clone)]
pub struct SessionLifecycle {
    state: SessionState,
}

impl SessionLifecycle {
    /// Start a session for the given data, validating the operator name
    pub fn start(session: &SessionData) -> Result<Self, LifecycleError> {
        if session.operator_name.trim().is_empty() {
            return Err(LifecycleError::InvalidStart(
                "operator name must not be empty".to_string(),
            ));
        }
        Ok(Self {
            state: SessionState::Active,
        })
    }

    /// Current state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Record a successful add (Active self-loop)
    pub fn record_added(&self) -> Result<(), LifecycleError> {
        match self.state {
            SessionState::Active => Ok(()),
            state => Err(LifecycleError::InvalidTransition {
                state,
                action: "add a record",
            }),
        }
    }

    /// Raise a finalize intent.
    ///
    /// With zero records the configured policy decides: `skip` terminates
    /// immediately (no report), `confirm` holds the session in Finalizing
    /// so the client can ask the operator.
    pub fn begin_finalize(
        &mut self,
        record_count: usize,
        on_empty: FinalizeEmpty,
    ) -> Result<FinalizeDecision, LifecycleError> {
        match self.state {
            SessionState::Active => {
                if record_count == 0 && on_empty == FinalizeEmpty::Skip {
                    self.state = SessionState::Terminated;
                    Ok(FinalizeDecision::SkippedEmpty)
                } else {
                    self.state = SessionState::Finalizing;
                    Ok(FinalizeDecision::ReportPending)
                }
            }
            state => Err(LifecycleError::InvalidTransition {
                state,
                action: "finalize",
            }),
        }
    }

    /// Cancel the finalize step and continue registering
    pub fn cancel_finalize(&mut self) -> Result<(), LifecycleError> {
        match self.state {
            SessionState::Finalizing => {
                self.state = SessionState::Active;
                Ok(())
            }
            state => Err(LifecycleError::InvalidTransition {
                state,
                action: "resume",
            }),
        }
    }

    /// Terminate the session (after dispatch, explicit skip, or logout)
    pub fn terminate(&mut self) -> Result<(), LifecycleError> {
        match self.state {
            SessionState::Active | SessionState::Finalizing => {
                self.state = SessionState::Terminated;
                Ok(())
            }
            state => Err(LifecycleError::InvalidTransition {
                state,
                action: "terminate",
            }),
        }
    }

    /// Whether a report may be dispatched right now
    pub fn can_dispatch(&self) -> bool {
        self.state == SessionState::Finalizing
    }
}
