//! Database schema definitions

use std::sync::OnceLock;

use regex::Regex;

use crate::{Error, Result};

/// The bundled schema script, applied once when a database file is created
pub const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Pragmas applied to every connection, fresh or reopened
pub const CONNECTION_PRAGMAS: &str = "PRAGMA foreign_keys = ON;";

/// Table holding the persisted schema version
pub const SCHEMA_TABLE: &str = "schema";

static VERSION_COMMENT: OnceLock<Regex> = OnceLock::new();

fn version_comment() -> &'static Regex {
    VERSION_COMMENT.get_or_init(|| {
        Regex::new(r"(?m)^-- schema ver\.: (?P<ver>\S+)[ \t\r]*$").expect("static regex is valid")
    })
}

/// Extract the version embedded as `-- schema ver.: <ver>` in a schema script
pub fn parse_version(script: &str) -> Result<String> {
    version_comment()
        .captures(script)
        .map(|caps| caps["ver"].to_string())
        .ok_or(Error::InvalidSchemaScript)
}

/// Version of the bundled schema script
pub fn expected_version() -> Result<String> {
    parse_version(SCHEMA_SQL)
}

/// Check that a table or column name can be spliced into SQL as-is.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub(crate) fn check_identifier(name: &str) -> Result<&str> {
    if is_identifier(name) {
        Ok(name)
    } else {
        Err(Error::InvalidIdentifier(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_version() {
        assert_eq!(expected_version().unwrap(), "1.0.0");
    }

    #[test]
    fn test_parse_version_needs_comment_line() {
        let script = "-- header\n-- schema ver.: 2.1.0\nCREATE TABLE t (id INTEGER);";
        assert_eq!(parse_version(script).unwrap(), "2.1.0");

        let missing = "CREATE TABLE t (id INTEGER); -- schema ver.: 2.1.0";
        assert!(matches!(parse_version(missing), Err(Error::InvalidSchemaScript)));
    }

    #[test]
    fn test_identifiers() {
        assert!(is_identifier("chem_subclass_map"));
        assert!(is_identifier("_x1"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("1abc"));
        assert!(!is_identifier("bgc; DROP TABLE bgc"));
        assert!(!is_identifier("a.b"));
    }
}
