//! Row access
//!
//! Thin parameterized insert/update/select over a table. Column names are
//! validated identifiers; values are always bound.

use serde::{Deserialize, Serialize};

use crate::db::connection::DatabaseConnection;
use crate::db::executor::{Record, SqlExecutor, SqlValue};
use crate::error::{Error, Result};
use crate::utils::naming::{join_names, validate_identifier};

/// A value for one named column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowValue {
    pub column_name: String,
    pub value: SqlValue,
}

impl RowValue {
    pub fn new(column_name: &str, value: impl Into<SqlValue>) -> Self {
        Self {
            column_name: column_name.to_string(),
            value: value.into(),
        }
    }
}

/// Sort direction for [`RowGateway::get_table_ordered`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    fn keyword(self) -> &'static str {
        match self {
            SortOrder::Ascending => "ASC",
            SortOrder::Descending => "DESC",
        }
    }
}

/// `INSERT INTO t(a, b) VALUES(?1, ?2)`, or `DEFAULT VALUES` for no columns
pub fn insert_sql(table_name: &str, columns: &[&str]) -> Result<String> {
    validate_identifier(table_name)?;
    if columns.is_empty() {
        return Ok(format!("INSERT INTO {} DEFAULT VALUES", table_name));
    }

    for column in columns {
        validate_identifier(column)?;
    }
    let params = (1..=columns.len())
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>();

    Ok(format!(
        "INSERT INTO {}({}) VALUES({})",
        table_name,
        join_names(columns),
        join_names(&params)
    ))
}

/// `UPDATE t SET col=?1`, restricted to `col=?2` when `filtered`
pub fn update_sql(table_name: &str, column: &str, filtered: bool) -> Result<String> {
    validate_identifier(table_name)?;
    validate_identifier(column)?;

    let mut sql = format!("UPDATE {} SET {}=?1", table_name, column);
    if filtered {
        sql.push_str(&format!(" WHERE {}=?2", column));
    }
    Ok(sql)
}

/// `SELECT * FROM t ORDER BY a, b ASC|DESC`. The direction binds to the
/// last column; earlier ones sort ascending.
pub fn select_ordered_sql(table_name: &str, order: SortOrder, columns: &[&str]) -> Result<String> {
    validate_identifier(table_name)?;
    if columns.is_empty() {
        return Ok(format!("SELECT * FROM {}", table_name));
    }

    for column in columns {
        validate_identifier(column)?;
    }
    Ok(format!(
        "SELECT * FROM {} ORDER BY {} {}",
        table_name,
        join_names(columns),
        order.keyword()
    ))
}

/// Row-level access to tables on the session
pub struct RowGateway<'a> {
    executor: SqlExecutor<'a>,
}

impl<'a> RowGateway<'a> {
    pub fn new(connection: &'a DatabaseConnection) -> Self {
        Self {
            executor: SqlExecutor::new(connection),
        }
    }

    /// Insert one row; columns not named take their defaults
    pub async fn add_row(&self, table_name: &str, values: &[RowValue]) -> Result<u64> {
        let columns: Vec<&str> = values.iter().map(|v| v.column_name.as_str()).collect();
        let params: Vec<SqlValue> = values.iter().map(|v| v.value.clone()).collect();

        let sql = insert_sql(table_name, &columns)?;
        self.executor.execute(&sql, &params).await
    }

    /// Replace every occurrence of `previous` in `column` with `new`
    pub async fn update_value(
        &self,
        table_name: &str,
        column: &str,
        previous: SqlValue,
        new: SqlValue,
    ) -> Result<u64> {
        let sql = update_sql(table_name, column, true)?;
        self.executor.execute(&sql, &[new, previous]).await
    }

    /// Set `column` to `new` on every row
    pub async fn update_all(&self, table_name: &str, column: &str, new: SqlValue) -> Result<u64> {
        let sql = update_sql(table_name, column, false)?;
        self.executor.execute(&sql, &[new]).await
    }

    pub async fn row_count(&self, table_name: &str) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM {}", validate_identifier(table_name)?);

        match self.executor.fetch_scalar(&sql, &[]).await? {
            Some(SqlValue::Integer(count)) => Ok(count.max(0) as u64),
            other => Err(Error::Validation(format!(
                "unexpected row count for '{}': {:?}",
                table_name, other
            ))),
        }
    }

    /// The row at `index` in the table's natural order
    pub async fn get_row(&self, table_name: &str, index: u64) -> Result<Option<Record>> {
        let sql = format!("SELECT * FROM {} LIMIT 1 OFFSET ?1", validate_identifier(table_name)?);
        let offset = i64::try_from(index)
            .map_err(|_| Error::Validation(format!("row index {} is out of range", index)))?;

        let mut rows = self.executor.fetch_rows(&sql, &[SqlValue::Integer(offset)]).await?;
        Ok(if rows.is_empty() { None } else { Some(rows.remove(0)) })
    }

    /// Every row of a table
    pub async fn get_table(&self, table_name: &str) -> Result<Vec<Record>> {
        let sql = format!("SELECT * FROM {}", validate_identifier(table_name)?);
        self.executor.fetch_rows(&sql, &[]).await
    }

    /// Every row of a table sorted by `columns`
    pub async fn get_table_ordered(
        &self,
        table_name: &str,
        order: SortOrder,
        columns: &[&str],
    ) -> Result<Vec<Record>> {
        let sql = select_ordered_sql(table_name, order, columns)?;
        self.executor.fetch_rows(&sql, &[]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_sql() {
        assert_eq!(
            insert_sql("people", &["Name", "Age"]).unwrap(),
            "INSERT INTO people(Name, Age) VALUES(?1, ?2)"
        );
        assert_eq!(insert_sql("people", &[]).unwrap(), "INSERT INTO people DEFAULT VALUES");
        assert!(insert_sql("people", &["Name) VALUES(1); --"]).is_err());
    }

    #[test]
    fn test_update_sql() {
        assert_eq!(update_sql("people", "Age", false).unwrap(), "UPDATE people SET Age=?1");
        assert_eq!(
            update_sql("people", "Age", true).unwrap(),
            "UPDATE people SET Age=?1 WHERE Age=?2"
        );
    }

    #[test]
    fn test_select_ordered_sql() {
        assert_eq!(
            select_ordered_sql("people", SortOrder::Descending, &["Age", "Name"]).unwrap(),
            "SELECT * FROM people ORDER BY Age, Name DESC"
        );
        assert_eq!(
            select_ordered_sql("people", SortOrder::Ascending, &[]).unwrap(),
            "SELECT * FROM people"
        );
    }

    #[test]
    fn test_row_value_new() {
        let value = RowValue::new("Age", 41_i64);
        assert_eq!(value.column_name, "Age");
        assert_eq!(value.value, SqlValue::Integer(41));
    }
}
