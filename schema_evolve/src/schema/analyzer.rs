//! Table schema reader
//!
//! This module reads a table's columns from the engine's metadata surface and
//! turns them into canonical [`ColumnDescriptor`]s.

use async_trait::async_trait;
use sqlx::{FromRow, Row};

use crate::db::connection::DatabaseConnection;
use crate::error::{Error, Result};
use crate::schema::classifier::classify;
use crate::schema::types::{ColumnDescriptor, ColumnMetadata, MetadataFlag, TableSchema};
use crate::utils::naming::validate_identifier;

/// One column as the metadata surface reports it. Boolean fields are
/// reported as text (`"True"` / `"False"`) and may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMetadataRow {
    pub table_name: String,
    pub column_name: String,
    pub data_type: Option<String>,
    pub primary_key: Option<String>,
    pub auto_increment: Option<String>,
    pub unique: Option<String>,
    pub is_nullable: Option<String>,
}

/// The engine's metadata query surface
#[async_trait]
pub trait MetadataSurface {
    /// Names of all user tables
    async fn table_names(&self) -> Result<Vec<String>>;

    /// Column rows for one table, in declaration order
    async fn column_rows(&self, table_name: &str) -> Result<Vec<ColumnMetadataRow>>;

    /// Names of every schema object (tables, indexes, views, triggers).
    /// Surfaces that only know about tables report those.
    async fn object_names(&self) -> Result<Vec<String>> {
        self.table_names().await
    }
}

#[derive(FromRow)]
struct TableRow {
    name: String,
}

fn flag_text(value: bool) -> Option<String> {
    Some(if value { "True" } else { "False" }.to_string())
}

/// Metadata surface over SQLite's catalog and pragmas
pub struct SqliteMetadata<'a> {
    connection: &'a DatabaseConnection,
}

impl<'a> SqliteMetadata<'a> {
    pub fn new(connection: &'a DatabaseConnection) -> Self {
        Self { connection }
    }

    /// Names of columns covered by a single-column UNIQUE constraint or index
    async fn unique_columns(&self, table_name: &str) -> Result<Vec<String>> {
        let pool = self.connection.pool()?;
        let mut unique = Vec::new();

        let indexes = sqlx::query(&format!("PRAGMA index_list({})", table_name))
            .fetch_all(pool)
            .await?;

        for index in indexes {
            let is_unique: i64 = index.try_get("unique")?;
            let origin: String = index.try_get("origin")?;
            // Primary keys are reported through their own field
            if is_unique == 0 || origin == "pk" {
                continue;
            }

            let index_name: String = index.try_get("name")?;
            let pragma = format!("PRAGMA index_info(\"{}\")", index_name.replace('"', "\"\""));
            let columns = sqlx::query(&pragma).fetch_all(pool).await?;

            if let [column] = columns.as_slice() {
                if let Some(name) = column.try_get::<Option<String>, _>("name")? {
                    unique.push(name);
                }
            }
        }

        Ok(unique)
    }
}

#[async_trait]
impl<'a> MetadataSurface for SqliteMetadata<'a> {
    async fn table_names(&self) -> Result<Vec<String>> {
        let pool = self.connection.pool()?;

        let sql = r#"SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'"#;
        let rows = sqlx::query_as::<_, TableRow>(sql).fetch_all(pool).await?;

        Ok(rows.into_iter().map(|row| row.name).collect())
    }

    async fn object_names(&self) -> Result<Vec<String>> {
        let pool = self.connection.pool()?;

        let sql = "SELECT name FROM sqlite_master WHERE name IS NOT NULL";
        let rows = sqlx::query_as::<_, TableRow>(sql).fetch_all(pool).await?;

        Ok(rows.into_iter().map(|row| row.name).collect())
    }

    async fn column_rows(&self, table_name: &str) -> Result<Vec<ColumnMetadataRow>> {
        validate_identifier(table_name)?;
        let pool = self.connection.pool()?;

        let pragma = format!("PRAGMA table_info({})", table_name);
        let columns = sqlx::query(&pragma).fetch_all(pool).await?;
        if columns.is_empty() {
            return Ok(Vec::new());
        }

        let create_sql: Option<Option<String>> =
            sqlx::query_scalar(
                "SELECT sql FROM sqlite_master WHERE type = 'table' AND name = ?1 COLLATE NOCASE",
            )
                .bind(table_name)
                .fetch_optional(pool)
                .await?;
        let declares_autoincrement = create_sql
            .flatten()
            .map_or(false, |sql| sql.to_uppercase().contains("AUTOINCREMENT"));

        let mut pk_count = 0;
        for col in &columns {
            if col.try_get::<i64, _>("pk")? > 0 {
                pk_count += 1;
            }
        }

        let unique = self.unique_columns(table_name).await?;

        let mut rows = Vec::with_capacity(columns.len());
        for col in columns {
            let name: String = col.try_get("name")?;
            let data_type: String = col.try_get("type")?;
            let notnull: i64 = col.try_get("notnull")?;
            let pk: i64 = col.try_get("pk")?;

            // Only a lone INTEGER PRIMARY KEY can carry AUTOINCREMENT
            let auto_increment = pk > 0
                && pk_count == 1
                && data_type.eq_ignore_ascii_case("integer")
                && declares_autoincrement;
            let is_unique = unique.iter().any(|u| u.eq_ignore_ascii_case(&name));

            rows.push(ColumnMetadataRow {
                table_name: table_name.to_string(),
                data_type: if data_type.is_empty() { None } else { Some(data_type) },
                primary_key: flag_text(pk > 0),
                auto_increment: flag_text(auto_increment),
                unique: flag_text(is_unique),
                is_nullable: flag_text(notnull == 0),
                column_name: name,
            });
        }

        Ok(rows)
    }
}

/// Reads canonical table schemas through a metadata surface
pub struct SchemaReader<'a> {
    surface: Box<dyn MetadataSurface + Send + Sync + 'a>,
    strict_flags: bool,
}

impl<'a> SchemaReader<'a> {
    /// Create a reader over the session's SQLite catalog
    pub fn new(connection: &'a DatabaseConnection) -> Self {
        Self::with_surface(SqliteMetadata::new(connection))
    }

    /// Create a reader over any metadata surface
    pub fn with_surface<M>(surface: M) -> Self
    where
        M: MetadataSurface + Send + Sync + 'a,
    {
        Self {
            surface: Box::new(surface),
            strict_flags: false,
        }
    }

    /// Fail reads on unreadable boolean metadata instead of reading it as false
    pub fn strict(mut self, strict_flags: bool) -> Self {
        self.strict_flags = strict_flags;
        self
    }

    /// Read a table's columns with each boolean field kept tri-state
    pub async fn read_column_metadata(&self, table_name: &str) -> Result<Vec<ColumnMetadata>> {
        let rows = self.surface.column_rows(table_name).await?;

        let columns = rows
            .into_iter()
            .filter(|row| row.table_name.eq_ignore_ascii_case(table_name))
            .map(|row| ColumnMetadata {
                canonical_type: classify(row.data_type.as_deref()),
                primary_key: MetadataFlag::parse(row.primary_key.as_deref()),
                auto_increment: MetadataFlag::parse(row.auto_increment.as_deref()),
                unique: MetadataFlag::parse(row.unique.as_deref()),
                is_nullable: MetadataFlag::parse(row.is_nullable.as_deref()),
                declared_type: row.data_type,
                name: row.column_name,
            })
            .collect();

        Ok(columns)
    }

    /// Read a table's columns in declaration order. A table without columns
    /// (or that does not exist) yields an empty list.
    pub async fn read_columns(&self, table_name: &str) -> Result<Vec<ColumnDescriptor>> {
        let metadata = self.read_column_metadata(table_name).await?;
        let mut columns = Vec::with_capacity(metadata.len());

        for column in &metadata {
            let unparsed = column.unparsed_fields();
            if !unparsed.is_empty() {
                if self.strict_flags {
                    return Err(Error::Metadata(format!(
                        "unreadable {} for column '{}' of '{}'",
                        unparsed.join(", "),
                        column.name,
                        table_name
                    )));
                }
                tracing::warn!(
                    table = table_name,
                    column = %column.name,
                    fields = ?unparsed,
                    "Unreadable column metadata, reading it as false"
                );
            }

            columns.push(column.to_descriptor());
        }

        Ok(columns)
    }

    /// Read a table's columns as a [`TableSchema`]
    pub async fn read_table(&self, table_name: &str) -> Result<TableSchema> {
        Ok(TableSchema::new(table_name, self.read_columns(table_name).await?))
    }

    /// Names of all user tables
    pub async fn table_names(&self) -> Result<Vec<String>> {
        self.surface.table_names().await
    }

    /// Names of every schema object, tables or not. A new table cannot
    /// take any of these names.
    pub async fn object_names(&self) -> Result<Vec<String>> {
        self.surface.object_names().await
    }

    pub async fn table_count(&self) -> Result<usize> {
        Ok(self.table_names().await?.len())
    }

    /// Whether a table exists (SQLite table names are case-insensitive)
    pub async fn table_exists(&self, table_name: &str) -> Result<bool> {
        Ok(self
            .table_names()
            .await?
            .iter()
            .any(|name| name.eq_ignore_ascii_case(table_name)))
    }

    pub async fn column_count(&self, table_name: &str) -> Result<usize> {
        Ok(self.read_column_metadata(table_name).await?.len())
    }
}
