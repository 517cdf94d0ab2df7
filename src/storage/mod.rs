//! Storage Layer - SQLite-backed persistence
//!
//! System of record is one SQLite file with tables:
//! - schema(ver)
//! - dataset, bgc, cds, bgc_class
//! - chem_class, chem_subclass, chem_subclass_map (reference data)

pub mod database;
pub mod queue;
pub mod record;
pub mod schema;

pub use database::{Database, DbStats};
pub use queue::{InsertQueue, PendingInsert};
pub use record::Record;
