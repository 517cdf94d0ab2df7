use tabled::{Table, Tabled, builder::Builder, settings::Style};

use crate::storage::record::display_value;
use crate::storage::{DbStats, Record};

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Table")]
    pub metric: String,
    #[tabled(rename = "Rows")]
    pub value: String,
}

pub struct TableBuilder {
    rows: Vec<TableRow>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    pub fn add_row(&mut self, label: &str, value: &str) {
        self.rows.push(TableRow {
            metric: label.to_string(),
            value: value.to_string(),
        });
    }

    pub fn build(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }

        Table::new(&self.rows).with(Style::rounded()).to_string()
    }
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn stats_table(stats: &DbStats) -> String {
    let mut builder = TableBuilder::new();
    for (table, count) in &stats.tables {
        builder.add_row(table, &count.to_string());
    }
    builder.build()
}

/// Render select results with one column per selected field
pub fn records_table(records: &[Record]) -> String {
    let Some(first) = records.first() else {
        return String::new();
    };

    let mut builder = Builder::default();
    builder.push_record(first.columns().map(str::to_string));
    for record in records {
        builder.push_record(record.iter().map(|(_, value)| display_value(value)));
    }

    builder.build().with(Style::rounded()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::types::Value;

    #[test]
    fn test_records_table_has_header_and_values() {
        let mut record = Record::new();
        record.push("id", Value::Integer(1));
        record.push("name", Value::Text("NRP".to_string()));

        let rendered = records_table(&[record]);
        assert!(rendered.contains("id"));
        assert!(rendered.contains("name"));
        assert!(rendered.contains("NRP"));
    }

    #[test]
    fn test_empty_tables_render_nothing() {
        assert!(records_table(&[]).is_empty());
        assert!(TableBuilder::new().build().is_empty());
    }
}
