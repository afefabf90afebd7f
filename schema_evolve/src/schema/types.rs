//! Type definitions for canonical schema objects

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::schema::classifier::classify;

/// The engine-independent column type categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CanonicalType {
    Integer,
    Text,
    Blob,
    Real,
    Numeric,
}

impl CanonicalType {
    /// Type name as written in a column definition
    pub fn sql_name(&self) -> &'static str {
        match self {
            CanonicalType::Integer => "INTEGER",
            CanonicalType::Text => "TEXT",
            CanonicalType::Blob => "BLOB",
            CanonicalType::Real => "REAL",
            CanonicalType::Numeric => "NUMERIC",
        }
    }
}

impl fmt::Display for CanonicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql_name())
    }
}

/// One column's declaration, as seen through the canonical type system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub declared_type: Option<String>,
    pub canonical_type: CanonicalType,
    pub not_null: bool,
    pub primary_key: bool,
    pub auto_increment: bool,
    pub unique: bool,
}

impl ColumnDescriptor {
    /// Create a column of the given canonical type with no constraints
    pub fn new(name: &str, canonical_type: CanonicalType) -> Self {
        Self {
            name: name.to_string(),
            declared_type: None,
            canonical_type,
            not_null: false,
            primary_key: false,
            auto_increment: false,
            unique: false,
        }
    }

    /// Create a column from an engine-reported type string
    pub fn from_declared(name: &str, declared_type: Option<&str>) -> Self {
        Self {
            declared_type: declared_type.map(str::to_string),
            ..Self::new(name, classify(declared_type))
        }
    }

    pub fn not_null(mut self, not_null: bool) -> Self {
        self.not_null = not_null;
        self
    }

    pub fn primary_key(mut self, primary_key: bool) -> Self {
        self.primary_key = primary_key;
        self
    }

    pub fn auto_increment(mut self, auto_increment: bool) -> Self {
        self.auto_increment = auto_increment;
        self
    }

    pub fn unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    /// Column definition as used in `CREATE TABLE` and `ADD COLUMN`, e.g.
    /// `Id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT`.
    ///
    /// Modifiers always come in the order NOT NULL, PRIMARY KEY,
    /// AUTOINCREMENT, UNIQUE; SQLite only accepts AUTOINCREMENT right after
    /// PRIMARY KEY.
    pub fn to_definition_fragment(&self) -> String {
        self.with_modifiers(format!("{} {}", self.name, self.canonical_type.sql_name()))
    }

    /// Column definition that restates the engine's own declaration: the
    /// declared type verbatim, or no type at all for a column declared
    /// without one. Recreating a column this way keeps its affinity, so
    /// copied values are stored unchanged.
    pub fn to_declared_fragment(&self) -> String {
        match self.declared_type.as_deref().map(str::trim) {
            Some(declared) if !declared.is_empty() => {
                self.with_modifiers(format!("{} {}", self.name, declared))
            }
            _ => self.with_modifiers(self.name.clone()),
        }
    }

    fn with_modifiers(&self, mut fragment: String) -> String {
        if self.not_null {
            fragment.push_str(" NOT NULL");
        }
        if self.primary_key {
            fragment.push_str(" PRIMARY KEY");
        }
        if self.auto_increment {
            fragment.push_str(" AUTOINCREMENT");
        }
        if self.unique {
            fragment.push_str(" UNIQUE");
        }

        fragment
    }
}

/// Join column definitions into a table-definition body
pub fn join_definitions(columns: &[ColumnDescriptor]) -> String {
    join_with(columns, ColumnDescriptor::to_definition_fragment)
}

/// Join the engine-declared definitions of `columns`, see
/// [`ColumnDescriptor::to_declared_fragment`]
pub fn join_declared_definitions(columns: &[ColumnDescriptor]) -> String {
    join_with(columns, ColumnDescriptor::to_declared_fragment)
}

fn join_with(columns: &[ColumnDescriptor], fragment: fn(&ColumnDescriptor) -> String) -> String {
    columns.iter().map(fragment).collect::<Vec<_>>().join(", ")
}

/// A boolean metadata field as read from the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetadataFlag {
    True,
    False,
    /// Missing, or not a recognizable boolean
    Unparsed,
}

impl MetadataFlag {
    /// Parse `true`/`false` (any case, surrounding whitespace ignored)
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("true") => MetadataFlag::True,
            Some(v) if v.eq_ignore_ascii_case("false") => MetadataFlag::False,
            _ => MetadataFlag::Unparsed,
        }
    }

    /// Boolean value, or `None` if the field was unreadable
    pub fn known(self) -> Option<bool> {
        match self {
            MetadataFlag::True => Some(true),
            MetadataFlag::False => Some(false),
            MetadataFlag::Unparsed => None,
        }
    }

    /// Boolean value with unreadable fields read as `false`
    pub fn or_false(self) -> bool {
        self.known().unwrap_or(false)
    }
}

/// A column's metadata with the boolean fields kept tri-state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMetadata {
    pub name: String,
    pub declared_type: Option<String>,
    pub canonical_type: CanonicalType,
    pub primary_key: MetadataFlag,
    pub auto_increment: MetadataFlag,
    pub unique: MetadataFlag,
    pub is_nullable: MetadataFlag,
}

impl ColumnMetadata {
    /// Names of the fields that could not be read
    pub fn unparsed_fields(&self) -> Vec<&'static str> {
        [
            ("PRIMARY_KEY", self.primary_key),
            ("AUTOINCREMENT", self.auto_increment),
            ("UNIQUE", self.unique),
            ("IS_NULLABLE", self.is_nullable),
        ]
        .into_iter()
        .filter(|(_, flag)| *flag == MetadataFlag::Unparsed)
        .map(|(field, _)| field)
        .collect()
    }

    /// Collapse into a descriptor, reading unreadable flags as `false` and
    /// unreadable nullability as nullable
    pub fn to_descriptor(&self) -> ColumnDescriptor {
        ColumnDescriptor {
            name: self.name.clone(),
            declared_type: self.declared_type.clone(),
            canonical_type: self.canonical_type,
            not_null: self.is_nullable.known().map_or(false, |nullable| !nullable),
            primary_key: self.primary_key.or_false(),
            auto_increment: self.auto_increment.or_false(),
            unique: self.unique.or_false(),
        }
    }
}

/// The ordered columns of one table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<ColumnDescriptor>,
}

impl TableSchema {
    pub fn new(name: &str, columns: Vec<ColumnDescriptor>) -> Self {
        Self {
            name: name.to_string(),
            columns,
        }
    }

    /// Find a column by name, ignoring ASCII case as SQLite does
    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Every column except `name`, in order
    pub fn without_column(&self, name: &str) -> Vec<ColumnDescriptor> {
        self.columns
            .iter()
            .filter(|c| !c.name.eq_ignore_ascii_case(name))
            .cloned()
            .collect()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_fragment_modifier_order() {
        let id = ColumnDescriptor::new("Id", CanonicalType::Integer)
            .not_null(true)
            .primary_key(true)
            .auto_increment(true);
        assert_eq!(id.to_definition_fragment(), "Id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT");

        let email = ColumnDescriptor::new("Email", CanonicalType::Text)
            .unique(true)
            .not_null(true);
        assert_eq!(email.to_definition_fragment(), "Email TEXT NOT NULL UNIQUE");

        let all = ColumnDescriptor::new("X", CanonicalType::Integer)
            .unique(true)
            .auto_increment(true)
            .primary_key(true)
            .not_null(true);
        assert_eq!(all.to_definition_fragment(), "X INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT UNIQUE");
    }

    #[test]
    fn test_fragment_without_modifiers() {
        let price = ColumnDescriptor::from_declared("Price", Some("decimal"));
        assert_eq!(price.to_definition_fragment(), "Price NUMERIC");
    }

    #[test]
    fn test_declared_fragment_keeps_engine_type() {
        let price = ColumnDescriptor::from_declared("Price", Some("DECIMAL(10,2)")).not_null(true);
        assert_eq!(price.to_declared_fragment(), "Price DECIMAL(10,2) NOT NULL");
        assert_eq!(price.to_definition_fragment(), "Price NUMERIC NOT NULL");

        let loose = ColumnDescriptor::from_declared("Loose", None).unique(true);
        assert_eq!(loose.to_declared_fragment(), "Loose UNIQUE");

        let code = ColumnDescriptor::from_declared("Code", Some("INT")).primary_key(true);
        assert_eq!(code.to_declared_fragment(), "Code INT PRIMARY KEY");
    }

    #[test]
    fn test_table_schema_lookup() {
        let schema = TableSchema::new(
            "people",
            vec![
                ColumnDescriptor::new("Id", CanonicalType::Integer).primary_key(true),
                ColumnDescriptor::new("Name", CanonicalType::Text),
                ColumnDescriptor::new("Age", CanonicalType::Integer),
            ],
        );

        assert_eq!(schema.column("name").map(|c| c.canonical_type), Some(CanonicalType::Text));
        assert!(schema.column("Email").is_none());
        assert_eq!(schema.column_names(), vec!["Id", "Name", "Age"]);

        let rest = schema.without_column("NAME");
        assert_eq!(rest.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(), vec!["Id", "Age"]);
    }

    #[test]
    fn test_join_definitions() {
        let columns = vec![
            ColumnDescriptor::new("Id", CanonicalType::Integer).primary_key(true),
            ColumnDescriptor::new("Name", CanonicalType::Text),
        ];
        assert_eq!(join_definitions(&columns), "Id INTEGER PRIMARY KEY, Name TEXT");
        assert_eq!(join_definitions(&[]), "");
    }

    #[test]
    fn test_metadata_flag_parse() {
        assert_eq!(MetadataFlag::parse(Some("True")), MetadataFlag::True);
        assert_eq!(MetadataFlag::parse(Some(" false ")), MetadataFlag::False);
        assert_eq!(MetadataFlag::parse(Some("1")), MetadataFlag::Unparsed);
        assert_eq!(MetadataFlag::parse(Some("")), MetadataFlag::Unparsed);
        assert_eq!(MetadataFlag::parse(None), MetadataFlag::Unparsed);
    }

    #[test]
    fn test_unparsed_nullability_reads_as_nullable() {
        let meta = ColumnMetadata {
            name: "Age".to_string(),
            declared_type: Some("int".to_string()),
            canonical_type: CanonicalType::Integer,
            primary_key: MetadataFlag::Unparsed,
            auto_increment: MetadataFlag::False,
            unique: MetadataFlag::True,
            is_nullable: MetadataFlag::Unparsed,
        };

        let column = meta.to_descriptor();
        assert!(!column.not_null);
        assert!(!column.primary_key);
        assert!(column.unique);
        assert_eq!(meta.unparsed_fields(), vec!["PRIMARY_KEY", "IS_NULLABLE"]);
    }

    #[test]
    fn test_not_nullable_reads_as_not_null() {
        let meta = ColumnMetadata {
            name: "Id".to_string(),
            declared_type: None,
            canonical_type: CanonicalType::Text,
            primary_key: MetadataFlag::False,
            auto_increment: MetadataFlag::False,
            unique: MetadataFlag::False,
            is_nullable: MetadataFlag::False,
        };
        assert!(meta.to_descriptor().not_null);
        assert!(meta.unparsed_fields().is_empty());
    }
}
