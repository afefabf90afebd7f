//! Shared helpers for the integration tests

#![allow(dead_code)]

use schema_evolve::{CanonicalType, ColumnDescriptor, Config, SchemaClient};

/// A client over a fresh in-memory database
pub async fn memory_client() -> SchemaClient {
    SchemaClient::new(Config::for_url("sqlite::memory:"))
        .await
        .expect("in-memory database opens")
}

/// `Id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT`
pub fn id_column() -> ColumnDescriptor {
    ColumnDescriptor::new("Id", CanonicalType::Integer)
        .not_null(true)
        .primary_key(true)
        .auto_increment(true)
}

pub fn column_names(columns: &[ColumnDescriptor]) -> Vec<String> {
    columns.iter().map(|c| c.name.clone()).collect()
}
