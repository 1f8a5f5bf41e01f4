//! Tasklist Database Layer
//!
//! This crate provides the persistence layer for users and their tasks,
//! using SQLite via sqlx.

pub mod error;
pub mod models;
pub mod repository;
pub mod utils;

pub use error::DbError;
pub use models::*;
pub use repository::Database;
