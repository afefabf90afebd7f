//! Table difference calculator
//!
//! Compares a table's current columns with a desired column list. Only
//! additions and removals are acted on; columns whose definition differs are
//! reported so callers can see what will not be changed.

use std::collections::HashSet;

use crate::schema::types::ColumnDescriptor;

/// Changes needed to bring one table to a desired column list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableDiff {
    pub columns_to_add: Vec<ColumnDescriptor>,
    pub columns_to_drop: Vec<String>,
    pub columns_to_alter: Vec<ColumnChange>,
}

/// A column present on both sides with a different definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnChange {
    pub column_name: String,
    pub from: ColumnDescriptor,
    pub to: ColumnDescriptor,
}

impl TableDiff {
    /// Diff `current` against `desired`, matching columns by name
    /// (case-insensitively, as SQLite does)
    pub fn between(current: &[ColumnDescriptor], desired: &[ColumnDescriptor]) -> Self {
        let current_names: HashSet<String> = current.iter().map(|c| c.name.to_lowercase()).collect();
        let desired_names: HashSet<String> = desired.iter().map(|c| c.name.to_lowercase()).collect();

        // Desired order, so added columns land in the order asked for
        let columns_to_add = desired
            .iter()
            .filter(|c| !current_names.contains(&c.name.to_lowercase()))
            .cloned()
            .collect();

        let columns_to_drop = current
            .iter()
            .filter(|c| !desired_names.contains(&c.name.to_lowercase()))
            .map(|c| c.name.clone())
            .collect();

        let columns_to_alter = desired
            .iter()
            .filter_map(|target| {
                let existing = current
                    .iter()
                    .find(|c| c.name.eq_ignore_ascii_case(&target.name))?;
                Self::column_needs_alteration(existing, target).then(|| ColumnChange {
                    column_name: target.name.clone(),
                    from: existing.clone(),
                    to: target.clone(),
                })
            })
            .collect();

        Self {
            columns_to_add,
            columns_to_drop,
            columns_to_alter,
        }
    }

    // Declared type strings are engine detail; compare canonical facts only
    fn column_needs_alteration(current: &ColumnDescriptor, target: &ColumnDescriptor) -> bool {
        current.canonical_type != target.canonical_type
            || current.not_null != target.not_null
            || current.primary_key != target.primary_key
            || current.auto_increment != target.auto_increment
            || current.unique != target.unique
    }

    /// Whether no column needs to be added or dropped
    pub fn is_empty(&self) -> bool {
        self.columns_to_add.is_empty() && self.columns_to_drop.is_empty()
    }
}
