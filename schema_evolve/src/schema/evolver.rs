//! Schema evolution
//!
//! Table creation and column addition map onto statements SQLite supports.
//! Column removal does not, so it is emulated by rebuilding the table:
//! create a replacement holding the surviving columns, copy the rows over,
//! drop the original and rename the replacement into its place, all inside
//! one transaction.

use crate::config::RebuildConfig;
use crate::db::connection::DatabaseConnection;
use crate::db::executor::SqlExecutor;
use crate::error::{Error, Result};
use crate::schema::analyzer::SchemaReader;
use crate::schema::diff::TableDiff;
use crate::schema::generator;
use crate::schema::types::ColumnDescriptor;
use crate::utils::naming::{generate_temp_table_name, NameSource, RandomSuffix};

/// Applies structural changes to tables on the session
pub struct SchemaEvolver<'a> {
    connection: &'a DatabaseConnection,
    rebuild: RebuildConfig,
    strict_flags: bool,
    names: Box<dyn NameSource + Send + 'a>,
}

impl<'a> SchemaEvolver<'a> {
    /// Create an evolver with default rebuild settings
    pub fn new(connection: &'a DatabaseConnection) -> Self {
        Self {
            connection,
            rebuild: RebuildConfig::default(),
            strict_flags: false,
            names: Box::new(RandomSuffix),
        }
    }

    pub fn rebuild_config(mut self, rebuild: RebuildConfig) -> Self {
        self.rebuild = rebuild;
        self
    }

    /// Fail on unreadable column metadata instead of reading it as false
    pub fn strict_flags(mut self, strict_flags: bool) -> Self {
        self.strict_flags = strict_flags;
        self
    }

    /// Replace the source of temporary table names
    pub fn name_source<N: NameSource + Send + 'a>(mut self, names: N) -> Self {
        self.names = Box::new(names);
        self
    }

    fn reader(&self) -> SchemaReader<'a> {
        SchemaReader::new(self.connection).strict(self.strict_flags)
    }

    /// Create a table unless one with that name already exists
    pub async fn create_table(&self, table_name: &str, columns: &[ColumnDescriptor]) -> Result<()> {
        let sql = generator::create_table_sql(table_name, columns)?;
        tracing::info!(table = table_name, columns = columns.len(), "Creating table");

        SqlExecutor::new(self.connection).execute(&sql, &[]).await?;
        Ok(())
    }

    /// Append a column. SQLite rejects NOT NULL columns without a default
    /// (and UNIQUE columns) here; that rejection is returned as is.
    pub async fn add_column(&self, table_name: &str, column: &ColumnDescriptor) -> Result<()> {
        let sql = generator::add_column_sql(table_name, column)?;
        tracing::info!(table = table_name, column = %column.name, "Adding column");

        SqlExecutor::new(self.connection).execute(&sql, &[]).await?;
        Ok(())
    }

    /// Remove a column by rebuilding the table without it.
    ///
    /// Fails with [`Error::ColumnNotFound`] if the table has no such column,
    /// and with [`Error::Validation`] if it is the table's only column. If
    /// any rebuild statement fails the transaction is rolled back and the
    /// original table is left untouched.
    pub async fn remove_column(&mut self, table_name: &str, column_name: &str) -> Result<()> {
        let reader = self.reader();

        let schema = reader.read_table(table_name).await?;
        if schema.columns.is_empty() {
            return Err(Error::TableNotFound(table_name.to_string()));
        }
        if schema.column(column_name).is_none() {
            return Err(Error::ColumnNotFound {
                table: table_name.to_string(),
                column: column_name.to_string(),
            });
        }

        let survivors = schema.without_column(column_name);
        if survivors.is_empty() {
            return Err(Error::Validation(format!(
                "cannot remove '{}', the only column of '{}'",
                column_name, table_name
            )));
        }

        let existing = reader.object_names().await?;
        let temp_name = generate_temp_table_name(
            self.names.as_mut(),
            table_name,
            &existing,
            self.rebuild.max_name_attempts,
        )?;

        let statements = generator::rebuild_statements(
            table_name,
            &temp_name,
            &survivors,
            self.rebuild.preserve_definitions,
        )?;

        tracing::info!(
            table = table_name,
            column = column_name,
            temp_table = %temp_name,
            survivors = survivors.len(),
            "Removing column by rebuilding table"
        );

        SqlExecutor::new(self.connection)
            .execute_in_transaction(&statements)
            .await
    }

    /// Drop a table
    pub async fn drop_table(&self, table_name: &str) -> Result<()> {
        let sql = generator::drop_table_sql(table_name)?;
        tracing::info!(table = table_name, "Dropping table");

        SqlExecutor::new(self.connection).execute(&sql, &[]).await?;
        Ok(())
    }

    /// Delete every row of a table, returning how many were removed
    pub async fn truncate_table(&self, table_name: &str) -> Result<u64> {
        let sql = generator::truncate_table_sql(table_name)?;
        SqlExecutor::new(self.connection).execute(&sql, &[]).await
    }

    /// Bring a table to the desired column list: create it if missing,
    /// otherwise add and then remove columns by name. Columns present on
    /// both sides with a different definition are left as they are.
    pub async fn sync_table(&mut self, table_name: &str, desired: &[ColumnDescriptor]) -> Result<TableDiff> {
        let current = self.reader().read_columns(table_name).await?;

        if current.is_empty() {
            self.create_table(table_name, desired).await?;
            return Ok(TableDiff {
                columns_to_add: desired.to_vec(),
                ..TableDiff::default()
            });
        }

        let diff = TableDiff::between(&current, desired);

        for change in &diff.columns_to_alter {
            tracing::warn!(
                table = table_name,
                column = %change.column_name,
                "Column definition differs; changing definitions is not supported"
            );
        }

        // Add before removing so a table is never rebuilt down to nothing
        for column in &diff.columns_to_add {
            self.add_column(table_name, column).await?;
        }
        for column in &diff.columns_to_drop {
            self.remove_column(table_name, column).await?;
        }

        Ok(diff)
    }
}
