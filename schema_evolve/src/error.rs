//! Error types for schema_evolve

use thiserror::Error;

/// Result type for schema_evolve operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for schema_evolve
#[derive(Error, Debug)]
pub enum Error {
    #[error("Not connected: open a database session first")]
    NotConnected,

    #[error("Engine error: {0}")]
    Engine(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid identifier '{0}'")]
    InvalidIdentifier(String),

    #[error("Column '{column}' not found in table '{table}'")]
    ColumnNotFound { table: String, column: String },

    #[error("Table '{0}' not found")]
    TableNotFound(String),

    #[error("Could not find a free temporary name for '{table}' after {attempts} attempts")]
    TempNameExhausted { table: String, attempts: usize },

    #[error("Metadata error: {0}")]
    Metadata(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl Error {
    /// Whether this error came straight from the database engine
    pub fn is_engine_failure(&self) -> bool {
        matches!(self, Error::Engine(_))
    }
}

/// Convert Serde JSON errors to schema_evolve errors
impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::SerializationError(error.to_string())
    }
}

/// Convert TOML deserialization errors to schema_evolve errors
impl From<toml::de::Error> for Error {
    fn from(error: toml::de::Error) -> Self {
        Error::ConfigError(error.to_string())
    }
}
