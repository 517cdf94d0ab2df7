//! # Chemstore - SQLite store for biosynthetic gene cluster data
//!
//! Chemstore provides:
//! - A bundled, versioned SQLite schema applied on first use
//! - Schema version checks when an existing database file is reopened
//! - A chemical class map (source type -> class/subclass) imported once at creation
//! - Deferred inserts with predicted primary keys, committed in one transaction
//!
//! The store is not safe for use by several processes at once: predicted IDs
//! assume nobody else writes to the same tables between `insert` and
//! `commit_insert`.

pub mod classification;
pub mod config;
pub mod storage;
pub mod ui;

// Re-exports for convenient access
pub use classification::{ClassMapping, ImportSummary};
pub use storage::{Database, DbStats, Record};

/// Result type alias for Chemstore operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Chemstore operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(
        "SQLite3 database exists but contains different schema version ({found} rather than {expected})"
    )]
    SchemaMismatch { found: String, expected: String },

    #[error("SQLite3 database exists but has no schema version row")]
    MissingSchemaVersion,

    #[error("SQLite3 database exists but its chemical class map was never imported")]
    MissingReferenceData,

    #[error("Schema script has no version comment")]
    InvalidSchemaScript,

    #[error("Don't specify id for INSERTs (table: {table})")]
    ExplicitPrimaryKey { table: String },

    #[error("Invalid identifier: {0:?}")]
    InvalidIdentifier(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Unknown chemical class: {0}")]
    UnknownClass(String),

    #[error("Not implemented yet: {0}")]
    NotImplemented(&'static str),
}
