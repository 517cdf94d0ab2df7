//! Chemical class map
//!
//! Maps the type strings reported by annotation sources (antiSMASH, MIBiG)
//! onto a two-level class/subclass hierarchy. The map ships with the crate
//! and is imported once, in the same transaction that creates a database file.

pub mod importer;
pub mod parser;

pub use importer::{ImportSummary, import_class_map};
pub use parser::{ClassMapping, parse_class_map};

/// The bundled class map (tab-separated, one header line)
pub const CLASS_MAP_TSV: &str = include_str!("chem_class_map.tsv");
