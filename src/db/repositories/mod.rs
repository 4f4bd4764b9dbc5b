//! Repositories
//!
//! Repository pattern implementations for data access. Each entity gets a
//! trait plus two strategies selected at construction time: a SQLite
//! implementation and an in-memory fallback for deployments without a
//! configured database.

pub mod record;
pub mod template;
pub mod user;

pub use record::{MemoryRecordRepository, RecordRepository, SqlxRecordRepository};
pub use template::{MemoryTemplateRepository, SqlxTemplateRepository, TemplateRepository};
pub use user::{MemoryUserRepository, SqlxUserRepository, UserRepository};
