//! Declared-type classification
//!
//! Maps whatever type string the engine reports for a column onto the five
//! canonical types. Follows SQLite's affinity idea, but in a fixed rule order
//! where the first match wins.

use crate::schema::types::CanonicalType;

/// Classify an engine-reported type string. Total: every input, including
/// none at all, yields exactly one type.
pub fn classify(declared_type: Option<&str>) -> CanonicalType {
    let declared = match declared_type {
        Some(declared) => declared.to_lowercase(),
        None => return CanonicalType::Text,
    };

    if declared.contains("int") {
        // int, integer, tinyint, bigint, unsigned big int, int2, int8, ...
        CanonicalType::Integer
    } else if declared.contains("blob") {
        CanonicalType::Blob
    } else if declared == "real" || declared.contains("double") || declared.contains("float") {
        CanonicalType::Real
    } else if declared == "numeric"
        || declared == "decimal"
        || declared.contains("bool")
        || declared.contains("date")
    {
        CanonicalType::Numeric
    } else {
        // character, varchar, nchar, text, clob, and anything unrecognized
        CanonicalType::Text
    }
}
