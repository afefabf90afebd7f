//! Database module for schema_evolve
//!
//! This module handles the engine session, statement execution and row access.

pub mod connection;
pub mod executor;
pub mod rows;

// Re-export key types
pub use connection::DatabaseConnection;
pub use executor::{Record, SqlExecutor, SqlValue};
pub use rows::{RowGateway, RowValue, SortOrder};
