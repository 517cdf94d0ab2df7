//! Deferred INSERT statements awaiting a single commit

use rusqlite::types::Value;

use super::schema::check_identifier;
use crate::{Error, Result};

/// Primary key column name that callers must never supply
pub const PRIMARY_KEY: &str = "id";

/// A prepared INSERT statement and its positional parameters
#[derive(Debug, Clone, PartialEq)]
pub struct PendingInsert {
    pub table: String,
    pub sql: String,
    pub params: Vec<Value>,
}

impl PendingInsert {
    /// Build an INSERT for `table` from column/value pairs.
    ///
    /// Fails without building anything if a column is the primary key or
    /// if any name is not a plain identifier.
    pub fn build<I, K, V>(table: &str, data: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let table = check_identifier(table)?;

        let mut columns = Vec::new();
        let mut params = Vec::new();
        for (key, value) in data {
            let key = key.as_ref();
            if key.eq_ignore_ascii_case(PRIMARY_KEY) {
                return Err(Error::ExplicitPrimaryKey {
                    table: table.to_string(),
                });
            }
            columns.push(check_identifier(key)?.to_string());
            params.push(value.into());
        }

        let sql = if columns.is_empty() {
            format!("INSERT INTO {} DEFAULT VALUES", table)
        } else {
            let placeholders = vec!["?"; columns.len()].join(",");
            format!(
                "INSERT INTO {}({}) VALUES ({})",
                table,
                columns.join(","),
                placeholders
            )
        };

        Ok(Self {
            table: table.to_string(),
            sql,
            params,
        })
    }
}

/// Ordered list of inserts, executed in enqueue order
#[derive(Debug, Default)]
pub struct InsertQueue {
    pending: Vec<PendingInsert>,
}

impl InsertQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, insert: PendingInsert) {
        self.pending.push(insert);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Remove and return everything queued so far
    pub fn drain(&mut self) -> Vec<PendingInsert> {
        std::mem::take(&mut self.pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_statement() {
        let insert = PendingInsert::build(
            "chem_subclass",
            [("name", Value::from("NRPS".to_string())), ("class_id", Value::from(2))],
        )
        .unwrap();

        assert_eq!(insert.sql, "INSERT INTO chem_subclass(name,class_id) VALUES (?,?)");
        assert_eq!(insert.params, vec![Value::Text("NRPS".to_string()), Value::Integer(2)]);
    }

    #[test]
    fn test_empty_data_uses_defaults() {
        let insert = PendingInsert::build("dataset", Vec::<(&str, Value)>::new()).unwrap();
        assert_eq!(insert.sql, "INSERT INTO dataset DEFAULT VALUES");
        assert!(insert.params.is_empty());
    }

    #[test]
    fn test_primary_key_rejected() {
        let err = PendingInsert::build("dataset", [("ID", 4)]).unwrap_err();
        assert!(matches!(err, Error::ExplicitPrimaryKey { .. }));
    }

    #[test]
    fn test_bad_identifiers_rejected() {
        assert!(matches!(
            PendingInsert::build("dataset; --", [("name", 1)]),
            Err(Error::InvalidIdentifier(_))
        ));
        assert!(matches!(
            PendingInsert::build("dataset", [("name)", 1)]),
            Err(Error::InvalidIdentifier(_))
        ));
    }

    #[test]
    fn test_queue_keeps_order() {
        let mut queue = InsertQueue::new();
        queue.push(PendingInsert::build("dataset", [("name", 1)]).unwrap());
        queue.push(PendingInsert::build("bgc", [("name", 2)]).unwrap());
        assert_eq!(queue.len(), 2);

        let tables: Vec<String> = queue.drain().into_iter().map(|p| p.table).collect();
        assert_eq!(tables, vec!["dataset", "bgc"]);
        assert!(queue.is_empty());
    }
}
