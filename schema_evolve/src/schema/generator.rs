//! DDL generator
//!
//! Builds the statement text for table creation, column addition and the
//! copy-and-swap rebuild. Every identifier is validated before it is placed
//! in SQL text.

use crate::error::{Error, Result};
use crate::schema::types::{join_declared_definitions, join_definitions, ColumnDescriptor};
use crate::utils::naming::{join_names, validate_identifier, validate_type_name};

/// `CREATE TABLE IF NOT EXISTS <table>(<definitions>)`
pub fn create_table_sql(table_name: &str, columns: &[ColumnDescriptor]) -> Result<String> {
    validate_identifier(table_name)?;
    if columns.is_empty() {
        return Err(Error::Validation(format!(
            "table '{}' needs at least one column",
            table_name
        )));
    }

    Ok(format!(
        "CREATE TABLE IF NOT EXISTS {}({})",
        table_name,
        table_body(columns, join_definitions)?
    ))
}

/// `ALTER TABLE <table> ADD COLUMN <definition>`
pub fn add_column_sql(table_name: &str, column: &ColumnDescriptor) -> Result<String> {
    validate_identifier(table_name)?;
    validate_identifier(&column.name)?;

    Ok(format!(
        "ALTER TABLE {} ADD COLUMN {}",
        table_name,
        column.to_definition_fragment()
    ))
}

/// `DROP TABLE <table>`
pub fn drop_table_sql(table_name: &str) -> Result<String> {
    Ok(format!("DROP TABLE {}", validate_identifier(table_name)?))
}

/// SQLite has no TRUNCATE; an unqualified DELETE empties the table
pub fn truncate_table_sql(table_name: &str) -> Result<String> {
    Ok(format!("DELETE FROM {}", validate_identifier(table_name)?))
}

/// The four statements that replace `table_name` with a copy holding only
/// `survivors`, to be run as one transaction.
///
/// With `preserve_definitions` the replacement declares each survivor the
/// way the engine reports it: declared type verbatim plus constraints, so
/// affinity and stored values carry over unchanged. Otherwise only the bare
/// column names are carried over and the survivors lose their types and
/// constraints.
pub fn rebuild_statements(
    table_name: &str,
    temp_name: &str,
    survivors: &[ColumnDescriptor],
    preserve_definitions: bool,
) -> Result<Vec<String>> {
    validate_identifier(table_name)?;
    validate_identifier(temp_name)?;
    if survivors.is_empty() {
        return Err(Error::Validation(format!(
            "cannot rebuild '{}' without any columns",
            table_name
        )));
    }

    let names = survivors.iter().map(|c| c.name.as_str()).collect::<Vec<_>>();
    for name in &names {
        validate_identifier(name)?;
    }
    let column_names = join_names(&names);

    let declaration = if preserve_definitions {
        for declared in survivors.iter().filter_map(|c| c.declared_type.as_deref()) {
            validate_type_name(declared)?;
        }
        table_body(survivors, join_declared_definitions)?
    } else {
        column_names.clone()
    };

    Ok(vec![
        format!("CREATE TABLE {}({})", temp_name, declaration),
        format!("INSERT INTO {} SELECT {} FROM {}", temp_name, column_names, table_name),
        format!("DROP TABLE {}", table_name),
        format!("ALTER TABLE {} RENAME TO {}", temp_name, table_name),
    ])
}

/// Column definitions joined with `", "`. A primary key spanning several
/// columns cannot be declared inline, so it moves to a table constraint.
fn table_body(columns: &[ColumnDescriptor], join: fn(&[ColumnDescriptor]) -> String) -> Result<String> {
    for column in columns {
        validate_identifier(&column.name)?;
    }

    let key_columns: Vec<&str> = columns
        .iter()
        .filter(|c| c.primary_key)
        .map(|c| c.name.as_str())
        .collect();

    if key_columns.len() <= 1 {
        return Ok(join(columns));
    }

    let inline: Vec<ColumnDescriptor> = columns
        .iter()
        .cloned()
        .map(|c| c.primary_key(false).auto_increment(false))
        .collect();

    Ok(format!(
        "{}, PRIMARY KEY ({})",
        join(&inline),
        join_names(&key_columns)
    ))
}
