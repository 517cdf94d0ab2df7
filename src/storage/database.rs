//! SQLite database wrapper with deferred inserts

use std::collections::HashMap;
use std::path::Path;

use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, params, params_from_iter};

use super::queue::{InsertQueue, PendingInsert};
use super::record::Record;
use super::schema::{self, check_identifier};
use crate::classification::{self, ImportSummary};
use crate::{Error, Result};

/// Wrapper around one SQLite connection.
///
/// Inserts are queued and only executed by [`Database::commit_insert`]. The
/// IDs returned by [`Database::insert`] are predictions: they hold only if
/// every queued insert succeeds unmodified and no other connection writes
/// to the same tables in the meantime. Do not share a database file between
/// processes that insert.
pub struct Database {
    conn: Connection,
    schema_version: String,
    last_indexes: HashMap<String, i64>,
    insert_queue: InsertQueue,
}

impl Database {
    /// Open a database file, creating and populating it if it doesn't exist
    pub fn open(path: &Path) -> Result<Self> {
        let expected = schema::expected_version()?;

        if path.exists() {
            tracing::debug!("Opening existing database {}", path.display());
            let conn = Connection::open(path)?;
            Self::reopen(conn, expected)
        } else {
            Self::create_file(path, expected, classification::CLASS_MAP_TSV)
        }
    }

    /// Open a fresh in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::create(conn, schema::expected_version()?, classification::CLASS_MAP_TSV)
    }

    /// Create a database file. A failed creation leaves no file behind.
    fn create_file(path: &Path, expected: String, class_map: &str) -> Result<Self> {
        tracing::info!("Creating new database {}", path.display());
        let conn = Connection::open(path)?;
        match Self::create(conn, expected, class_map) {
            Ok(db) => Ok(db),
            Err(e) => {
                if let Err(rm) = std::fs::remove_file(path) {
                    tracing::warn!("Could not remove {}: {}", path.display(), rm);
                }
                Err(e)
            }
        }
    }

    fn reopen(conn: Connection, expected: String) -> Result<Self> {
        conn.execute_batch(schema::CONNECTION_PRAGMAS)?;

        let mut db = Self {
            conn,
            schema_version: expected,
            last_indexes: HashMap::new(),
            insert_queue: InsertQueue::new(),
        };

        let found = db.stored_schema_version()?;
        if found != db.schema_version {
            return Err(Error::SchemaMismatch {
                found,
                expected: db.schema_version,
            });
        }

        if db.count_rows("chem_subclass_map")? == 0 {
            return Err(Error::MissingReferenceData);
        }

        db.load_last_indexes()?;
        Ok(db)
    }

    /// Apply the schema and import the class map in one transaction
    fn create(conn: Connection, expected: String, class_map: &str) -> Result<Self> {
        conn.execute_batch(schema::CONNECTION_PRAGMAS)?;

        let mut db = Self {
            conn,
            schema_version: expected,
            last_indexes: HashMap::new(),
            insert_queue: InsertQueue::new(),
        };

        db.conn.execute_batch("BEGIN;")?;
        match db.populate(class_map) {
            Ok(summary) => {
                db.conn.execute_batch("COMMIT;")?;
                tracing::info!(
                    "Imported chemical class map: {} subclasses, {} mappings",
                    summary.subclasses,
                    summary.mappings
                );
                Ok(db)
            }
            Err(e) => {
                // some failures already end the transaction inside SQLite
                if !db.conn.is_autocommit() {
                    if let Err(rb) = db.conn.execute_batch("ROLLBACK;") {
                        tracing::warn!("Rollback after failed creation failed: {}", rb);
                    }
                }
                Err(e)
            }
        }
    }

    fn populate(&mut self, class_map: &str) -> Result<ImportSummary> {
        self.conn.execute_batch(schema::SCHEMA_SQL)?;
        self.load_last_indexes()?;
        let mappings = classification::parse_class_map(class_map)?;
        classification::import_class_map(self, &mappings)
    }

    fn stored_schema_version(&self) -> Result<String> {
        if !self.table_exists(schema::SCHEMA_TABLE)? {
            return Err(Error::MissingSchemaVersion);
        }
        let rows = self.select(schema::SCHEMA_TABLE, "WHERE 1", &[], &["ver"])?;
        rows.first()
            .and_then(|row| row.get_str("ver"))
            .map(str::to_string)
            .ok_or(Error::MissingSchemaVersion)
    }

    fn table_exists(&self, name: &str) -> Result<bool> {
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1 LIMIT 1",
                params![name],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Replace the in-memory counters with the persisted `sqlite_sequence` values
    fn load_last_indexes(&mut self) -> Result<()> {
        self.last_indexes.clear();
        if !self.table_exists("sqlite_sequence")? {
            return Ok(());
        }
        for row in self.select("sqlite_sequence", "WHERE 1", &[], &["name", "seq"])? {
            if let (Some(name), Some(seq)) = (row.get_str("name"), row.get_i64("seq")) {
                self.last_indexes.insert(name.to_string(), seq);
            }
        }
        tracing::debug!("Loaded {} table counters", self.last_indexes.len());
        Ok(())
    }

    // ========== Queries ==========

    /// Execute `SELECT <columns> FROM <table> <clause>`.
    ///
    /// `clause` is raw SQL (typically `WHERE ...`, may be empty) bound with
    /// positional `params`. An empty `columns` list selects `*`.
    pub fn select(
        &self,
        table: &str,
        clause: &str,
        params: &[Value],
        columns: &[&str],
    ) -> Result<Vec<Record>> {
        let table = check_identifier(table)?;
        let columns_sql = if columns.is_empty() {
            "*".to_string()
        } else {
            columns
                .iter()
                .map(|c| check_identifier(c))
                .collect::<Result<Vec<_>>>()?
                .join(",")
        };

        let sql = format!("SELECT {} FROM {} {}", columns_sql, table, clause);
        let mut stmt = self.conn.prepare(&sql)?;
        let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let records = stmt
            .query_map(params_from_iter(params.iter()), |row| {
                let mut record = Record::new();
                for (idx, name) in names.iter().enumerate() {
                    record.push(name.clone(), row.get::<_, Value>(idx)?);
                }
                Ok(record)
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(records)
    }

    /// Queue an INSERT and return the ID it is predicted to receive.
    ///
    /// Nothing is written until [`Database::commit_insert`]. Supplying the
    /// `id` column is an error and leaves the queue untouched.
    pub fn insert<I, K, V>(&mut self, table: &str, data: I) -> Result<i64>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let insert = PendingInsert::build(table, data)?;

        let new_id = self.last_index(&insert.table) + 1;
        tracing::debug!("Queued insert into {} (predicted id {})", insert.table, new_id);
        self.last_indexes.insert(insert.table.clone(), new_id);
        self.insert_queue.push(insert);
        Ok(new_id)
    }

    /// Execute every queued insert, in order, inside one transaction.
    ///
    /// Returns the number of statements executed. On failure nothing is
    /// persisted, the queue is discarded and predictions restart from the
    /// persisted counters.
    pub fn commit_insert(&mut self) -> Result<usize> {
        let pending = self.insert_queue.drain();
        tracing::info!("Committing {} inserts..", pending.len());

        match Self::execute_all(&mut self.conn, &pending) {
            Ok(()) => Ok(pending.len()),
            Err(e) => {
                tracing::warn!("Commit failed, discarded {} queued inserts: {}", pending.len(), e);
                self.load_last_indexes()?;
                Err(e)
            }
        }
    }

    /// Runs inside a savepoint so that an enclosing transaction is reused
    fn execute_all(conn: &mut Connection, pending: &[PendingInsert]) -> Result<()> {
        let sp = conn.savepoint()?;
        for insert in pending {
            sp.execute(&insert.sql, params_from_iter(insert.params.iter()))?;
        }
        sp.commit()?;
        Ok(())
    }

    fn count_rows(&self, table: &str) -> Result<usize> {
        let table = check_identifier(table)?;
        let count: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Updating rows is not supported yet.
    pub fn update<I, K, V>(&mut self, _table: &str, _id: i64, _data: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        Err(Error::NotImplemented("update"))
    }

    /// Close the connection, discarding any uncommitted inserts
    pub fn close(mut self) -> Result<()> {
        if !self.insert_queue.is_empty() {
            tracing::warn!(
                "Closing database with {} uncommitted inserts",
                self.insert_queue.len()
            );
            self.insert_queue.drain();
        }
        self.conn.close().map_err(|(_, e)| Error::Storage(e))
    }

    // ========== Accessors ==========

    /// Schema version this database was validated against
    pub fn schema_version(&self) -> &str {
        &self.schema_version
    }

    pub fn pending_inserts(&self) -> usize {
        self.insert_queue.len()
    }

    /// Highest ID predicted or persisted for a table (0 when none)
    pub fn last_index(&self, table: &str) -> i64 {
        self.last_indexes.get(table).copied().unwrap_or(0)
    }

    /// Look up the (class, subclass) a source type string maps to
    pub fn classify(&self, class_source: &str, type_source: &str) -> Result<Option<(String, String)>> {
        self.conn
            .query_row(
                r#"
                SELECT chem_class.name, chem_subclass.name
                FROM chem_subclass_map
                JOIN chem_subclass ON chem_subclass.id = chem_subclass_map.subclass_id
                JOIN chem_class ON chem_class.id = chem_subclass.class_id
                WHERE chem_subclass_map.class_source = ?1 AND chem_subclass_map.type_source = ?2
                "#,
                params![class_source, type_source],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(Into::into)
    }

    /// Row counts of every user table
    pub fn stats(&self) -> Result<DbStats> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )?;
        let tables = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut counts = Vec::with_capacity(tables.len());
        for table in tables {
            let count = self.count_rows(&table)?;
            counts.push((table, count));
        }

        Ok(DbStats {
            schema_version: self.schema_version.clone(),
            tables: counts,
            pending_inserts: self.insert_queue.len(),
        })
    }
}

/// Database statistics
#[derive(Debug, Clone)]
pub struct DbStats {
    pub schema_version: String,
    pub tables: Vec<(String, usize)>,
    pub pending_inserts: usize,
}

impl DbStats {
    pub fn rows(&self, table: &str) -> Option<usize> {
        self.tables.iter().find(|(name, _)| name == table).map(|(_, n)| *n)
    }
}

impl std::fmt::Display for DbStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Database Statistics (schema {}):", self.schema_version)?;
        for (table, count) in &self.tables {
            writeln!(f, "  {}: {}", table, count)?;
        }
        write!(f, "  Pending inserts: {}", self.pending_inserts)
    }
}
