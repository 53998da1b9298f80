//! Minimal CSV tables: a header row plus string cells, looked up by column
//! name. Handles quoted fields with embedded commas and doubled quotes, a
//! UTF-8 byte-order mark, and CRLF line endings. Quoted newlines are not
//! supported; the telemetry exports never contain them.

use std::path::{Path, PathBuf};

use crate::loader::DataLoadError;

/// A parsed CSV file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CsvTable {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl CsvTable {
    /// Parse CSV text. The first non-empty line is the header; blank lines
    /// are skipped.
    pub fn parse(text: &str) -> Self {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut lines = text.lines().filter(|line| !line.trim().is_empty());
        let header = lines
            .next()
            .map(|line| split_record(line).into_iter().map(|h| h.trim().to_string()).collect())
            .unwrap_or_default();
        let rows = lines.map(split_record).collect();
        Self { header, rows }
    }

    /// Read and parse a CSV file.
    pub fn read(path: &Path) -> Result<Self, DataLoadError> {
        Ok(Self::parse(&std::fs::read_to_string(path)?))
    }

    /// Index of a column by exact header name.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h == name)
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Column positions resolved against one table, with a path for errors.
pub(crate) struct Columns<'a> {
    table: &'a CsvTable,
    file: &'a Path,
}

impl<'a> Columns<'a> {
    pub(crate) fn new(table: &'a CsvTable, file: &'a Path) -> Self {
        Self { table, file }
    }

    pub(crate) fn required(&self, name: &'static str) -> Result<usize, DataLoadError> {
        self.table
            .column(name)
            .ok_or_else(|| DataLoadError::MissingColumn {
                file: PathBuf::from(self.file),
                column: name,
            })
    }

    pub(crate) fn optional(&self, name: &str) -> Option<usize> {
        self.table.column(name)
    }
}

/// Split one CSV record into trimmed-of-quotes fields.
pub fn split_record(line: &str) -> Vec<String> {
    let line = line.trim_end_matches('\r');
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut chars = line.chars().peekable();
    let mut quoted = false;

    while let Some(c) = chars.next() {
        match c {
            '"' if quoted => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    quoted = false;
                }
            }
            '"' if field.is_empty() => quoted = true,
            ',' if !quoted => fields.push(std::mem::take(&mut field)),
            _ => field.push(c),
        }
    }
    fields.push(field);
    fields
}

/// Cell text at `index`, or `""` for short rows.
pub fn cell(row: &[String], index: usize) -> &str {
    row.get(index).map(|s| s.trim()).unwrap_or("")
}

/// Numeric cell with pandas-style coercion: anything that is not a finite
/// number reads as `None`.
pub fn number(row: &[String], index: usize) -> Option<f64> {
    cell(row, index)
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Lap-like cell. Accepts `12` and `12.0`; anything else is `None`.
pub fn whole_number(row: &[String], index: usize) -> Option<u32> {
    let text = cell(row, index);
    if let Ok(n) = text.parse::<u32>() {
        return Some(n);
    }
    number(row, index)
        .filter(|v| *v >= 0.0 && v.fract() == 0.0 && *v <= f64::from(u32::MAX))
        .map(|v| v as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_and_rows() {
        let table = CsvTable::parse("LapNumber,Driver,LapTimeSeconds\n1,VER,92.5\n1,HAM,93.0\n");
        assert_eq!(table.column("Driver"), Some(1));
        assert_eq!(table.column("Missing"), None);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[1], vec!["1", "HAM", "93.0"]);
    }

    #[test]
    fn quoted_fields_keep_commas_and_quotes() {
        assert_eq!(
            split_record(r#"1,"Las Vegas, NV","say ""hi""",x"#),
            vec!["1", "Las Vegas, NV", r#"say "hi""#, "x"]
        );
    }

    #[test]
    fn bom_crlf_and_blank_lines() {
        let table = CsvTable::parse("\u{feff}Driver,AvgLapTime\r\n\r\nVER,90.1\r\n");
        assert_eq!(table.header(), ["Driver", "AvgLapTime"]);
        assert_eq!(table.rows(), [vec!["VER".to_string(), "90.1".to_string()]]);
    }

    #[test]
    fn empty_text_is_an_empty_table() {
        let table = CsvTable::parse("");
        assert!(table.header().is_empty());
        assert!(table.is_empty());
    }

    #[test]
    fn numeric_coercion() {
        let row: Vec<String> = ["92.5", "", "NaN", "abc", "12.0", "3", "-1"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(number(&row, 0), Some(92.5));
        assert_eq!(number(&row, 1), None);
        assert_eq!(number(&row, 2), None);
        assert_eq!(number(&row, 3), None);
        assert_eq!(whole_number(&row, 4), Some(12));
        assert_eq!(whole_number(&row, 5), Some(3));
        assert_eq!(whole_number(&row, 6), None);
        assert_eq!(whole_number(&row, 0), None);
        assert_eq!(number(&row, 9), None);
    }
}
