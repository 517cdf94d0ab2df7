//! Rows returned by `Database::select`

use rusqlite::types::Value;

/// One result row: column names mapped to values, in select order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    columns: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, column: impl Into<String>, value: Value) {
        self.columns.push((column.into(), value));
    }

    /// Get a value by column name
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn get_i64(&self, column: &str) -> Option<i64> {
        match self.get(column)? {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn get_f64(&self, column: &str) -> Option<f64> {
        match self.get(column)? {
            Value::Real(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn get_str(&self, column: &str) -> Option<&str> {
        match self.get(column)? {
            Value::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Render as a JSON object (blobs become arrays of bytes)
    pub fn to_json(&self) -> serde_json::Value {
        let map = self
            .columns
            .iter()
            .map(|(name, value)| (name.clone(), value_to_json(value)))
            .collect::<serde_json::Map<_, _>>();
        serde_json::Value::Object(map)
    }
}

/// Human-readable rendering of a single SQLite value
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Integer(i) => i.to_string(),
        Value::Real(f) => f.to_string(),
        Value::Text(s) => s.clone(),
        Value::Blob(b) => format!("<{} bytes>", b.len()),
    }
}

fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Integer(i) => serde_json::Value::from(*i),
        Value::Real(f) => serde_json::Value::from(*f),
        Value::Text(s) => serde_json::Value::from(s.as_str()),
        Value::Blob(b) => serde_json::Value::from(b.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Record {
        let mut record = Record::new();
        record.push("id", Value::Integer(3));
        record.push("name", Value::Text("NRPS".to_string()));
        record.push("score", Value::Real(0.5));
        record.push("note", Value::Null);
        record
    }

    #[test]
    fn test_typed_accessors() {
        let record = sample();
        assert_eq!(record.get_i64("id"), Some(3));
        assert_eq!(record.get_str("name"), Some("NRPS"));
        assert_eq!(record.get_f64("score"), Some(0.5));
        assert_eq!(record.get_f64("id"), Some(3.0));
        assert_eq!(record.get("note"), Some(&Value::Null));
        assert_eq!(record.get_str("id"), None);
        assert!(record.get("missing").is_none());
    }

    #[test]
    fn test_column_order_is_kept() {
        let record = sample();
        let names: Vec<&str> = record.columns().collect();
        assert_eq!(names, vec!["id", "name", "score", "note"]);
        assert_eq!(record.len(), 4);
    }

    #[test]
    fn test_to_json() {
        let json = sample().to_json();
        assert_eq!(json["id"], 3);
        assert_eq!(json["name"], "NRPS");
        assert!(json["note"].is_null());
    }
}
