//! Data models
//!
//! This module contains all data structures used throughout the ShelfCheck
//! service. Models represent:
//! - Persisted entities (ProductTemplate, ValidityRecord, User)
//! - Ephemeral session state (SessionData)
//! - Internal data transfer objects

mod record;
mod session;
mod template;
mod user;

pub use record::{ExpiryStatus, RecordedTime, ValidityRecord};
pub use session::SessionData;
pub use template::{CreateTemplateInput, Period, ProductGroup, ProductTemplate};
pub use user::{CreateUserInput, User, UserRole};
