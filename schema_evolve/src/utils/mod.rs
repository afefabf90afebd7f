//! Utilities for schema_evolve
//!
//! This module provides utility functions used across the library.

pub mod naming;
pub mod logging;

// Re-export key utility functions
pub use naming::{
    generate_temp_table_name, is_sql_keyword, join_names, validate_identifier,
    NameSource, RandomSuffix,
};
