//! Naming utilities for schema_evolve
//!
//! Identifier validation for everything interpolated into SQL text, and the
//! temporary-table name generation used by column removal.

use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;

use crate::error::{Error, Result};

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid"));

static TYPE_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_ ]*(\(\s*[+-]?[0-9]+\s*(,\s*[+-]?[0-9]+\s*)?\))?$")
        .expect("type name pattern is valid")
});

/// Check that a declared column type (`DECIMAL(10,2)`, `UNSIGNED BIG INT`,
/// ...) is safe to restate in SQL text
pub fn validate_type_name(declared: &str) -> Result<&str> {
    if !TYPE_NAME.is_match(declared.trim()) {
        return Err(Error::InvalidIdentifier(declared.to_string()));
    }

    Ok(declared)
}

/// Check that a table or column name is safe to place in SQL text
pub fn validate_identifier(name: &str) -> Result<&str> {
    if !IDENTIFIER.is_match(name) || is_sql_keyword(name) {
        return Err(Error::InvalidIdentifier(name.to_string()));
    }

    Ok(name)
}

/// Check if a name is a reserved SQL keyword
pub fn is_sql_keyword(name: &str) -> bool {
    const SQL_KEYWORDS: &[&str] = &[
        "abort", "add", "all", "alter", "and", "as", "asc", "autoincrement", "begin", "between",
        "by", "case", "check", "collate", "column", "commit", "constraint", "create", "cross",
        "default", "deferrable", "delete", "desc", "distinct", "drop", "else", "end", "escape",
        "except", "exists", "foreign", "from", "full", "glob", "group", "having", "in", "index",
        "inner", "insert", "intersect", "into", "is", "isnull", "join", "key", "left", "like",
        "limit", "natural", "not", "notnull", "null", "offset", "on", "or", "order", "outer",
        "pragma", "primary", "references", "rename", "right", "rollback", "select", "set",
        "table", "then", "to", "transaction", "union", "unique", "update", "using", "values",
        "view", "when", "where", "with",
    ];

    SQL_KEYWORDS.contains(&name.to_lowercase().as_str())
}

/// Join column names with `", "`
pub fn join_names<S: AsRef<str>>(names: &[S]) -> String {
    names
        .iter()
        .map(|name| name.as_ref())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Source of candidate names for the temporary table of a rebuild
pub trait NameSource {
    /// Propose a candidate derived from `seed`. Candidates may collide with
    /// existing schema objects; the caller checks and asks again.
    fn candidate(&mut self, seed: &str) -> String;
}

/// Seed plus a random numeric suffix in `0..100000`
#[derive(Debug, Default)]
pub struct RandomSuffix;

impl NameSource for RandomSuffix {
    fn candidate(&mut self, seed: &str) -> String {
        let suffix: u32 = rand::thread_rng().gen_range(0..100_000);
        format!("{}{}", seed, suffix)
    }
}

/// Ask `source` for candidates until one is absent from `existing`
pub fn generate_temp_table_name<N: NameSource + ?Sized>(
    source: &mut N,
    seed: &str,
    existing: &[String],
    max_attempts: usize,
) -> Result<String> {
    for attempt in 1..=max_attempts {
        let candidate = source.candidate(seed);

        if !existing.iter().any(|name| name.eq_ignore_ascii_case(&candidate)) {
            return Ok(candidate);
        }

        tracing::debug!(candidate = %candidate, attempt, "Temporary table name collides, retrying");
    }

    Err(Error::TempNameExhausted {
        table: seed.to_string(),
        attempts: max_attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Replays a fixed list of suffixes
    struct Scripted(Vec<&'static str>);

    impl NameSource for Scripted {
        fn candidate(&mut self, seed: &str) -> String {
            format!("{}{}", seed, self.0.remove(0))
        }
    }

    #[test]
    fn test_validate_identifier() {
        assert!(validate_identifier("users").is_ok());
        assert!(validate_identifier("_tmp_1").is_ok());
        assert!(validate_identifier("Id").is_ok());

        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("1users").is_err());
        assert!(validate_identifier("user name").is_err());
        assert!(validate_identifier("users; DROP TABLE x").is_err());
        assert!(validate_identifier("select").is_err());
        assert!(validate_identifier("TABLE").is_err());
    }

    #[test]
    fn test_validate_type_name() {
        for declared in ["INTEGER", "DECIMAL(10,2)", "numeric( 5 , 1 )", "UNSIGNED BIG INT", "VARCHAR(40)"] {
            assert!(validate_type_name(declared).is_ok(), "{}", declared);
        }
        for declared in ["", "TEXT); DROP TABLE x", "INT -- c", "CHAR(1) DEFAULT 'a'", "x(1,2,3)"] {
            assert!(validate_type_name(declared).is_err(), "{}", declared);
        }
    }

    #[test]
    fn test_is_sql_keyword() {
        assert!(is_sql_keyword("SELECT"));
        assert!(is_sql_keyword("autoincrement"));
        assert!(!is_sql_keyword("username"));
    }

    #[test]
    fn test_join_names() {
        assert_eq!(join_names(&["a", "b", "c"]), "a, b, c");
        assert_eq!(join_names(&["a"]), "a");
        assert_eq!(join_names::<&str>(&[]), "");
    }

    #[test]
    fn test_random_suffix_keeps_seed() {
        let name = RandomSuffix.candidate("people");
        assert!(name.starts_with("people"));
        assert!(name["people".len()..].parse::<u32>().unwrap() < 100_000);
        assert!(validate_identifier(&name).is_ok());
    }

    #[test]
    fn test_temp_name_retries_past_collisions() {
        let existing = vec!["t".to_string(), "t1".to_string(), "T2".to_string()];
        let mut source = Scripted(vec!["1", "2", "3"]);

        let name = generate_temp_table_name(&mut source, "t", &existing, 10).unwrap();
        assert_eq!(name, "t3");
    }

    #[test]
    fn test_temp_name_gives_up() {
        let existing = vec!["t".to_string(), "t1".to_string()];
        let mut source = Scripted(vec!["1", "1", "1"]);

        let result = generate_temp_table_name(&mut source, "t", &existing, 3);
        assert!(matches!(result, Err(Error::TempNameExhausted { attempts: 3, .. })));
    }

    #[test]
    fn test_random_temp_names_never_collide() {
        // Occupy every even suffix so roughly half the candidates collide
        let existing: Vec<String> = (0..100_000).step_by(2).map(|n| format!("t{}", n)).collect();

        for _ in 0..200 {
            let name = generate_temp_table_name(&mut RandomSuffix, "t", &existing, 1_000).unwrap();
            assert!(!existing.contains(&name));
        }
    }
}
