/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 15/10/26
******************************************************************************/

//! Import records and the CSV reader.

use fixstatus_core::error::ConfigurationError;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// One data row of the import.
///
/// Cells keep the column order of the header row. A short row simply lacks
/// its trailing columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportRecord {
    row: usize,
    cells: Vec<(String, String)>,
}

impl ImportRecord {
    /// Creates a record from `(column, value)` pairs.
    ///
    /// # Arguments
    /// * `row` - 1-based data row number, used in diagnostics
    /// * `cells` - Column name and cell value pairs in column order
    #[must_use]
    pub fn new<K, V>(row: usize, cells: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            row,
            cells: cells
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Returns the 1-based data row number.
    #[must_use]
    pub const fn row(&self) -> usize {
        self.row
    }

    /// Returns the value of a column, if present.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }

    /// Iterates `(column, value)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cells.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns the number of cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns true if the record has no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Reads every record from a CSV file whose first row holds the column names.
///
/// # Errors
/// Returns `ConfigurationError::ImportUnreadable` if the file cannot be opened
/// or is not valid CSV.
pub fn read_import(path: impl AsRef<Path>) -> Result<Vec<ImportRecord>, ConfigurationError> {
    let path = path.as_ref();
    let unreadable = |e: csv::Error| ConfigurationError::ImportUnreadable {
        path: path.display().to_string(),
        reason: e.to_string(),
    };

    let reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(unreadable)?;
    let records = collect(reader).map_err(unreadable)?;
    info!(path = %path.display(), records = records.len(), "import loaded");
    Ok(records)
}

/// Reads every record from CSV text in any reader.
///
/// # Errors
/// Returns `ConfigurationError::ImportUnreadable` (with path `<reader>`) on
/// malformed input.
pub fn read_import_from<R: Read>(source: R) -> Result<Vec<ImportRecord>, ConfigurationError> {
    let reader = csv::ReaderBuilder::new().flexible(true).from_reader(source);
    collect(reader).map_err(|e| ConfigurationError::ImportUnreadable {
        path: "<reader>".to_string(),
        reason: e.to_string(),
    })
}

fn collect<R: Read>(mut reader: csv::Reader<R>) -> Result<Vec<ImportRecord>, csv::Error> {
    let headers = reader.headers()?.clone();
    let mut records = Vec::new();

    for (index, row) in reader.records().enumerate() {
        let row = row?;
        let number = index + 1;
        if row.len() > headers.len() {
            debug!(
                row = number,
                extra = row.len() - headers.len(),
                "cells beyond the header row ignored"
            );
        }
        records.push(ImportRecord::new(number, headers.iter().zip(row.iter())));
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_import_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "MsgType,SenderCompID,TargetCompID,55,38").unwrap();
        writeln!(file, "D,A,B,AAPL,100").unwrap();
        writeln!(file, "D,A,B").unwrap();
        file.flush().unwrap();

        let records = read_import(file.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].row(), 1);
        assert_eq!(records[0].get("55"), Some("AAPL"));
        assert_eq!(records[1].row(), 2);
        assert_eq!(records[1].len(), 3);
        assert_eq!(records[1].get("55"), None);
    }

    #[test]
    fn test_read_import_keeps_column_order() {
        let records = read_import_from("44,MsgType,11\n1.5,D,X\n".as_bytes()).unwrap();
        let columns: Vec<_> = records[0].iter().map(|(k, _)| k).collect();
        assert_eq!(columns, ["44", "MsgType", "11"]);
    }

    #[test]
    fn test_read_import_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.csv");
        let err = read_import(&path).unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::ImportUnreadable { path: ref p, .. } if p.ends_with("absent.csv")
        ));
    }

    #[test]
    fn test_read_import_invalid_utf8() {
        let invalid_utf8: &[u8] = b"MsgType\n\xFF\xFE\n";
        assert!(matches!(
            read_import_from(invalid_utf8),
            Err(ConfigurationError::ImportUnreadable { .. })
        ));
    }

    #[test]
    fn test_header_only_import_is_empty() {
        let records = read_import_from("MsgType,SenderCompID,TargetCompID\n".as_bytes()).unwrap();
        assert!(records.is_empty());
    }
}
