//! Parser for the tab-separated chemical class map

use crate::{Error, Result};

/// Subclass used when a map row leaves it empty
pub const DEFAULT_SUBCLASS: &str = "other";
/// Class used when a map row leaves it empty
pub const DEFAULT_CLASS: &str = "Other";

/// One row of the class map: a source type string and the class/subclass it belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassMapping {
    /// Where the type string comes from (e.g. `antismash`, `mibig`)
    pub class_source: String,
    /// The type string as reported by that source
    pub type_source: String,
    pub class: String,
    pub subclass: String,
}

impl ClassMapping {
    /// Parse one data line. `line_no` is 1-based and only used for errors.
    pub fn parse_line(line: &str, line_no: usize) -> Result<Self> {
        let fields: Vec<&str> = line.split('\t').collect();
        let (class_source, type_source, class, subclass) = match fields.as_slice() {
            [a, b, c, d] => (*a, *b, *c, *d),
            // trailing empty fields with their tabs stripped
            [a, b, c] => (*a, *b, *c, ""),
            [a, b] => (*a, *b, "", ""),
            _ => {
                return Err(Error::Parse(format!(
                    "class map line {}: expected 4 tab-separated fields, found {}",
                    line_no,
                    fields.len()
                )));
            }
        };

        let class = if class.trim().is_empty() { DEFAULT_CLASS } else { class.trim() };
        let subclass = if subclass.trim().is_empty() {
            DEFAULT_SUBCLASS
        } else {
            subclass.trim()
        };

        Ok(Self {
            class_source: class_source.to_string(),
            type_source: type_source.to_string(),
            class: class.to_string(),
            subclass: subclass.to_string(),
        })
    }
}

/// Parse a whole class map file. The first line is a header and is skipped.
pub fn parse_class_map(text: &str) -> Result<Vec<ClassMapping>> {
    text.lines()
        .enumerate()
        .skip(1)
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| ClassMapping::parse_line(line, idx + 1))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_row() {
        let m = ClassMapping::parse_line("antismash\tT1PKS\tPolyketide\tT1PKS", 2).unwrap();
        assert_eq!(m.class_source, "antismash");
        assert_eq!(m.type_source, "T1PKS");
        assert_eq!(m.class, "Polyketide");
        assert_eq!(m.subclass, "T1PKS");
    }

    #[test]
    fn test_empty_fields_get_defaults() {
        let m = ClassMapping::parse_line("antismash\tterpene\tTerpene\t", 2).unwrap();
        assert_eq!(m.subclass, "other");

        let m = ClassMapping::parse_line("antismash\tother\t\t", 2).unwrap();
        assert_eq!(m.class, "Other");
        assert_eq!(m.subclass, "other");

        let m = ClassMapping::parse_line("mibig\tNRP\tNRP", 2).unwrap();
        assert_eq!(m.subclass, "other");

        let m = ClassMapping::parse_line("antismash\tother", 2).unwrap();
        assert_eq!(m.class, "Other");
        assert_eq!(m.subclass, "other");
    }

    #[test]
    fn test_bad_field_count_reports_line() {
        let text = "source\ttype\tclass\tsubclass\nantismash\tNRPS\tNRP\tNRPS\nbroken\n";
        let err = parse_class_map(text).unwrap_err();
        assert!(err.to_string().contains("line 3"), "{}", err);
    }

    #[test]
    fn test_header_and_blank_lines_skipped() {
        let text = "source\ttype\tclass\tsubclass\r\n\r\nmibig\tRiPP\tRiPP\t\r\n";
        let rows = parse_class_map(text).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].class, "RiPP");
        assert_eq!(rows[0].subclass, "other");
    }
}
