//! SQL executor
//!
//! Passthrough statement execution against the session. Values are always
//! bound as parameters (`?1`, `?2`, ...); only identifiers ever appear in
//! SQL text.
//!
//! Statements here are not kept in the connection's statement cache. The
//! session is a single long-lived connection and a cached `SELECT *` keeps
//! the column list it was prepared with, which goes stale as soon as DDL
//! adds or removes a column.

use futures::{StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Column, Row, Sqlite, TypeInfo, ValueRef};

use crate::db::connection::DatabaseConnection;
use crate::error::{Error, Result};

/// A value bound into, or read out of, a statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Integer(value)
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        SqlValue::Real(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(value: Vec<u8>) -> Self {
        SqlValue::Blob(value)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(SqlValue::Null, Into::into)
    }
}

/// One result row, columns in select order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub values: Vec<(String, SqlValue)>,
}

impl Record {
    /// Look up a value by column name
    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.values
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Column names in select order
    pub fn columns(&self) -> Vec<&str> {
        self.values.iter().map(|(name, _)| name.as_str()).collect()
    }
}

/// SQL executor for running statements on the session
pub struct SqlExecutor<'a> {
    connection: &'a DatabaseConnection,
}

impl<'a> SqlExecutor<'a> {
    /// Create a new SQL executor
    pub fn new(connection: &'a DatabaseConnection) -> Self {
        Self { connection }
    }

    /// Execute a single statement, returning the number of affected rows
    pub async fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<u64> {
        let pool = self.connection.pool()?;
        tracing::debug!(sql = sql, params = params.len(), "Executing statement");

        let result = build_query(sql, params).execute(pool).await?;
        Ok(result.rows_affected())
    }

    /// Execute multiple statements in order, stopping at the first failure
    pub async fn execute_batch(&self, statements: &[String]) -> Result<()> {
        for statement in statements {
            self.execute(statement, &[]).await?;
        }

        Ok(())
    }

    /// Execute multiple statements as one transaction: all of them commit or
    /// none of them persist
    pub async fn execute_in_transaction(&self, statements: &[String]) -> Result<()> {
        let pool = self.connection.pool()?;
        let mut tx = pool.begin().await?;

        for statement in statements {
            tracing::debug!(sql = %statement, "Executing in transaction");
            // An early return drops `tx`, which rolls the transaction back
            sqlx::query(statement).persistent(false).execute(&mut *tx).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Fetch the first column of the first row, if any row is returned
    pub async fn fetch_scalar(&self, sql: &str, params: &[SqlValue]) -> Result<Option<SqlValue>> {
        let pool = self.connection.pool()?;

        let row = build_query(sql, params).fetch_optional(pool).await?;
        match row {
            Some(row) if !row.is_empty() => Ok(Some(decode_value(&row, 0)?)),
            _ => Ok(None),
        }
    }

    /// Fetch all rows, reading the cursor forward once
    pub async fn fetch_rows(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<Record>> {
        let pool = self.connection.pool()?;

        build_query(sql, params)
            .fetch(pool)
            .map(|row| row.map_err(Error::from).and_then(|row| decode_row(&row)))
            .try_collect::<Vec<Record>>()
            .await
    }
}

fn build_query<'q>(sql: &'q str, params: &'q [SqlValue]) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    params.iter().fold(sqlx::query(sql).persistent(false), bind_value)
}

fn bind_value<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: &'q SqlValue,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        SqlValue::Null => query.bind(Option::<i64>::None),
        SqlValue::Integer(v) => query.bind(*v),
        SqlValue::Real(v) => query.bind(*v),
        SqlValue::Text(v) => query.bind(v.as_str()),
        SqlValue::Blob(v) => query.bind(v.as_slice()),
    }
}

fn decode_row(row: &SqliteRow) -> Result<Record> {
    let values = row
        .columns()
        .iter()
        .map(|column| Ok((column.name().to_string(), decode_value(row, column.ordinal())?)))
        .collect::<Result<Vec<_>>>()?;

    Ok(Record { values })
}

// SQLite is dynamically typed, so go by the storage class of the value itself
// rather than the declared column type.
fn decode_value(row: &SqliteRow, index: usize) -> Result<SqlValue> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(SqlValue::Null);
    }

    let value = match raw.type_info().name() {
        "INTEGER" => SqlValue::Integer(row.try_get(index)?),
        "REAL" => SqlValue::Real(row.try_get(index)?),
        "BLOB" => SqlValue::Blob(row.try_get(index)?),
        _ => SqlValue::Text(row.try_get(index)?),
    };

    Ok(value)
}
