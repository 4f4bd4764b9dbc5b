//! Database layer
//!
//! SQLite persistence for the ShelfCheck service. The repositories are
//! trait-based: `Sqlx*` implementations back onto the pool created here,
//! while `Memory*` implementations cover deployments without a configured
//! database (and double as test fixtures). Which strategy runs is decided
//! once, at construction time in `main`.

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{create_pool, create_test_pool};
