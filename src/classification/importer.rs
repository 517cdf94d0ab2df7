//! One-time import of the class map into `chem_subclass` / `chem_subclass_map`

use std::collections::HashMap;

use rusqlite::types::Value;

use super::parser::ClassMapping;
use crate::storage::Database;
use crate::{Error, Result};

/// Counts of rows written by an import
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub subclasses: usize,
    pub mappings: usize,
}

/// Import class map rows and commit them.
///
/// Every class must already exist in `chem_class`. A subclass is reused when
/// it exists in the database or was queued earlier in this import, so each
/// (class, subclass) pair is inserted at most once.
pub fn import_class_map(db: &mut Database, mappings: &[ClassMapping]) -> Result<ImportSummary> {
    let class_ids: HashMap<String, i64> = db
        .select("chem_class", "WHERE 1", &[], &["id", "name"])?
        .iter()
        .filter_map(|row| Some((row.get_str("name")?.to_string(), row.get_i64("id")?)))
        .collect();

    let mut queued_subclasses: HashMap<(i64, String), i64> = HashMap::new();
    let mut summary = ImportSummary::default();

    for mapping in mappings {
        let class_id = *class_ids
            .get(&mapping.class)
            .ok_or_else(|| Error::UnknownClass(mapping.class.clone()))?;

        let key = (class_id, mapping.subclass.clone());
        let subclass_id = match queued_subclasses.get(&key) {
            Some(id) => *id,
            None => {
                let id = match find_subclass(db, class_id, &mapping.subclass)? {
                    Some(id) => id,
                    None => {
                        summary.subclasses += 1;
                        db.insert(
                            "chem_subclass",
                            [
                                ("name", Value::from(mapping.subclass.clone())),
                                ("class_id", Value::from(class_id)),
                            ],
                        )?
                    }
                };
                queued_subclasses.insert(key, id);
                id
            }
        };

        db.insert(
            "chem_subclass_map",
            [
                ("class_source", Value::from(mapping.class_source.clone())),
                ("type_source", Value::from(mapping.type_source.clone())),
                ("subclass_id", Value::from(subclass_id)),
            ],
        )?;
        summary.mappings += 1;
    }

    db.commit_insert()?;
    Ok(summary)
}

fn find_subclass(db: &Database, class_id: i64, name: &str) -> Result<Option<i64>> {
    let existing = db.select(
        "chem_subclass",
        "WHERE name = ? AND class_id = ?",
        &[Value::from(name.to_string()), Value::from(class_id)],
        &["id"],
    )?;
    Ok(existing.first().and_then(|row| row.get_i64("id")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classification::parse_class_map;

    const SMALL_MAP: &str = "source\ttype\tclass\tsubclass\n\
        antismash\tT1PKS\tPolyketide\tT1PKS\n\
        antismash\tT1PKS-like\tPolyketide\tT1PKS\n\
        mibig\tPolyketide\tPolyketide\t\n";

    #[test]
    fn test_shared_subclass_created_once() {
        let mut db = Database::open_in_memory().unwrap();
        let before = db.stats().unwrap();
        let mappings = parse_class_map(SMALL_MAP).unwrap();

        let summary = import_class_map(&mut db, &mappings).unwrap();
        assert_eq!(summary.mappings, 3);

        let after = db.stats().unwrap();
        assert_eq!(
            after.rows("chem_subclass_map").unwrap(),
            before.rows("chem_subclass_map").unwrap() + 3
        );
        // T1PKS and Polyketide/other already come from the bundled map
        assert_eq!(summary.subclasses, 0);
        assert_eq!(after.rows("chem_subclass"), before.rows("chem_subclass"));
    }

    #[test]
    fn test_new_subclass_ids_match_predictions() {
        let mut db = Database::open_in_memory().unwrap();
        let map = "h\th\th\th\nlocal\tmystery\tAlkaloid\tPyrrolizidine\nlocal\tmystery2\tAlkaloid\tPyrrolizidine\n";
        let mappings = parse_class_map(map).unwrap();
        let predicted = db.last_index("chem_subclass") + 1;

        let summary = import_class_map(&mut db, &mappings).unwrap();
        assert_eq!(summary, ImportSummary { subclasses: 1, mappings: 2 });

        let rows = db
            .select("chem_subclass", "WHERE name = ?", &[Value::from("Pyrrolizidine".to_string())], &["id"])
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get_i64("id"), Some(predicted));
        assert_eq!(
            db.classify("local", "mystery2").unwrap(),
            Some(("Alkaloid".to_string(), "Pyrrolizidine".to_string()))
        );
    }

    #[test]
    fn test_unknown_class_rejected() {
        let mut db = Database::open_in_memory().unwrap();
        let mappings = parse_class_map("h\th\th\th\nlocal\tx\tPeptide\tfoo\n").unwrap();
        let err = import_class_map(&mut db, &mappings).unwrap_err();
        assert!(matches!(err, Error::UnknownClass(ref c) if c == "Peptide"));
    }
}
