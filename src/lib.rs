//! ShelfCheck - expiry tracking and session reporting for retail stores
//!
//! This library provides the core functionality for the ShelfCheck service.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
