//! schema_evolve: canonical table schemas and column removal for SQLite
//!
//! Reads a table's columns into engine-independent [`ColumnDescriptor`]s and
//! evolves tables in ways SQLite cannot do directly. Removing a column
//! rebuilds the table inside a single transaction.

pub mod config;
pub mod db;
pub mod error;
pub mod schema;
pub mod utils;

// Re-export main types for easier access
pub use config::Config;
pub use db::connection::DatabaseConnection;
pub use db::executor::{Record, SqlExecutor, SqlValue};
pub use db::rows::{RowGateway, RowValue, SortOrder};
pub use error::{Error, Result};
pub use schema::analyzer::SchemaReader;
pub use schema::diff::TableDiff;
pub use schema::evolver::SchemaEvolver;
pub use schema::types::{CanonicalType, ColumnDescriptor, TableSchema};

/// Initialize a client with the specified configuration file
pub async fn init(config_path: &str) -> Result<SchemaClient> {
    let config = config::load_from_file(config_path)?;
    SchemaClient::new(config).await
}

/// The main client: one configured session and the components over it
pub struct SchemaClient {
    config: Config,
    db_connection: DatabaseConnection,
}

impl SchemaClient {
    /// Open a session from configuration
    pub async fn new(config: Config) -> Result<Self> {
        let db_connection = DatabaseConnection::connect(&config.database).await?;

        Ok(Self {
            config,
            db_connection,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db_connection
    }

    /// A schema reader honoring the configured metadata strictness
    pub fn reader(&self) -> SchemaReader<'_> {
        SchemaReader::new(&self.db_connection).strict(self.config.metadata.strict_flags)
    }

    /// A schema evolver honoring the configured rebuild settings
    pub fn evolver(&self) -> SchemaEvolver<'_> {
        SchemaEvolver::new(&self.db_connection)
            .rebuild_config(self.config.rebuild.clone())
            .strict_flags(self.config.metadata.strict_flags)
    }

    pub fn rows(&self) -> RowGateway<'_> {
        RowGateway::new(&self.db_connection)
    }

    pub fn executor(&self) -> SqlExecutor<'_> {
        SqlExecutor::new(&self.db_connection)
    }

    /// Read a table's columns in declaration order
    pub async fn read_columns(&self, table_name: &str) -> Result<Vec<ColumnDescriptor>> {
        self.reader().read_columns(table_name).await
    }

    pub async fn table_names(&self) -> Result<Vec<String>> {
        self.reader().table_names().await
    }

    pub async fn create_table(&self, table_name: &str, columns: &[ColumnDescriptor]) -> Result<()> {
        self.evolver().create_table(table_name, columns).await
    }

    pub async fn add_column(&self, table_name: &str, column: &ColumnDescriptor) -> Result<()> {
        self.evolver().add_column(table_name, column).await
    }

    pub async fn remove_column(&self, table_name: &str, column_name: &str) -> Result<()> {
        self.evolver().remove_column(table_name, column_name).await
    }

    /// Bring a table to the desired column list
    pub async fn sync_table(&self, table_name: &str, desired: &[ColumnDescriptor]) -> Result<TableDiff> {
        let diff = self.evolver().sync_table(table_name, desired).await?;

        if diff.is_empty() {
            tracing::info!(table = table_name, "Table is already in sync");
        }
        Ok(diff)
    }

    /// Close the session
    pub async fn close(mut self) -> Result<()> {
        self.db_connection.close().await
    }
}
