//! Services layer - Business logic
//!
//! This module contains the business logic of the ShelfCheck service:
//! - Expiry status classification (pure, time-injected)
//! - Session aggregation and the session lifecycle state machine
//! - Report composition and dispatch
//! - Record, template and user operations with capability checks

pub mod dispatch;
pub mod record;
pub mod report;
pub mod session;
pub mod status;
pub mod template;
pub mod user;

pub use dispatch::{DispatchError, DispatchResult, EmailTransport, ReportDispatcher};
pub use record::{NewRecordInput, RecordService, RecordServiceError};
pub use report::{compose, parse_recipients, ComposeError, Report, ReportLine};
pub use session::{
    FinalizeDecision, LifecycleError, SessionAggregator, SessionCounts, SessionLifecycle,
    SessionState,
};
pub use status::{classify, classify_record, StatusPolicy};
pub use template::{TemplateService, TemplateServiceError};
pub use user::{UserService, UserServiceError};
