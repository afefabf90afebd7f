//! Schema module for schema_evolve
//!
//! This module handles type classification, schema reading, and evolution.

pub mod analyzer;
pub mod classifier;
pub mod diff;
pub mod evolver;
pub mod generator;
pub mod types;

// Re-export key types
pub use analyzer::{ColumnMetadataRow, MetadataSurface, SchemaReader, SqliteMetadata};
pub use classifier::classify;
pub use diff::{ColumnChange, TableDiff};
pub use evolver::SchemaEvolver;
pub use types::{
    CanonicalType, ColumnDescriptor, ColumnMetadata, MetadataFlag, TableSchema,
};
