//! Database session handling
//!
//! A [`DatabaseConnection`] is the single engine session every component
//! borrows. It is opened with [`DatabaseConnection::connect`], used, and then
//! closed with [`DatabaseConnection::close`]; any operation after close (or on
//! a never-opened session) fails with [`Error::NotConnected`].

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};

use crate::config::DatabaseConfig;
use crate::error::{Error, Result};

/// The engine session
#[derive(Debug, Default)]
pub struct DatabaseConnection {
    pool: Option<Pool<Sqlite>>,
}

impl DatabaseConnection {
    /// Open a session from configuration
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let timeout_seconds = config.timeout_seconds.unwrap_or(30);

        let options = SqliteConnectOptions::from_str(&config.url)?
            .create_if_missing(config.create_if_missing);

        // One connection, never recycled: an in-memory database lives and dies
        // with its connection, and every unit of work is sequential anyway.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .acquire_timeout(Duration::from_secs(timeout_seconds))
            .connect_with(options)
            .await?;

        tracing::debug!(url = %config.url, "Opened database session");

        Ok(Self { pool: Some(pool) })
    }

    /// A session that has not been opened
    pub fn disconnected() -> Self {
        Self::default()
    }

    /// Whether a session is currently open
    pub fn is_connected(&self) -> bool {
        self.pool.as_ref().map_or(false, |pool| !pool.is_closed())
    }

    /// Borrow the underlying pool, or fail if no session is open
    pub fn pool(&self) -> Result<&Pool<Sqlite>> {
        match &self.pool {
            Some(pool) if !pool.is_closed() => Ok(pool),
            _ => Err(Error::NotConnected),
        }
    }

    /// Close the session. Closing twice is an error, as is closing a
    /// session that was never opened.
    pub async fn close(&mut self) -> Result<()> {
        let pool = self.pool.take().ok_or(Error::NotConnected)?;
        pool.close().await;
        tracing::debug!("Closed database session");
        Ok(())
    }
}
