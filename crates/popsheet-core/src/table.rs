//! # Local Worksheet
//!
//! An in-memory worksheet that supports the same row operations popsheet
//! asks of a remote spreadsheet: insert at a row index, append, sort.
//!
//! The worksheet persists as pretty-printed JSON:
//!
//! ```json
//! {
//!   "title": "Sheet1",
//!   "rows": [["Name", "Population"], ["Chad", 16425859]]
//! }
//! ```

use crate::{PopsheetError, Row, SortSpec, sort_rows};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default title of a fresh worksheet.
pub const DEFAULT_TITLE: &str = "Sheet1";

/// A worksheet held in memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Worksheet {
    pub title: String,
    #[serde(default)]
    pub rows: Vec<Row>,
}

impl Default for Worksheet {
    fn default() -> Self {
        Self::new(DEFAULT_TITLE)
    }
}

impl Worksheet {
    /// Create an empty worksheet.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            rows: Vec::new(),
        }
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Width of the widest row.
    #[must_use]
    pub fn width(&self) -> usize {
        self.rows.iter().map(Row::width).max().unwrap_or(0)
    }

    /// Insert a row at a 1-based index, shifting later rows down.
    ///
    /// `at` may be one past the last row, which appends.
    pub fn insert_row(&mut self, row: Row, at: usize) -> Result<(), PopsheetError> {
        if at == 0 || at > self.rows.len() + 1 {
            return Err(PopsheetError::InvalidRow(format!(
                "Cannot insert at row {} of a {}-row worksheet",
                at,
                self.rows.len()
            )));
        }
        self.rows.insert(at - 1, row);
        Ok(())
    }

    pub fn append_row(&mut self, row: Row) {
        self.rows.push(row);
    }

    pub fn append_rows(&mut self, rows: impl IntoIterator<Item = Row>) {
        self.rows.extend(rows);
    }

    /// Sort the worksheet rows.
    pub fn sort(&mut self, spec: &SortSpec) -> Result<(), PopsheetError> {
        let width = self.width();
        let column = spec.column.index();
        if !self.is_empty() && column >= width {
            return Err(PopsheetError::ColumnOutOfRange { column, width });
        }
        sort_rows(&mut self.rows, spec);
        Ok(())
    }

    // =========================================================================
    // PERSISTENCE
    // =========================================================================

    pub fn to_json(&self) -> Result<String, PopsheetError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| PopsheetError::SerializationError(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, PopsheetError> {
        serde_json::from_str(json).map_err(|e| PopsheetError::DeserializationError(e.to_string()))
    }

    /// Load a worksheet file. A missing file yields an empty worksheet.
    pub fn load(path: &Path) -> Result<Self, PopsheetError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path).map_err(|e| {
            PopsheetError::IoError(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&contents)
    }

    pub fn save(&self, path: &Path) -> Result<(), PopsheetError> {
        let json = self.to_json()?;
        std::fs::write(path, json).map_err(|e| {
            PopsheetError::IoError(format!("Cannot write {}: {}", path.display(), e))
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{COLUMN_COUNT, Cell, Column, Country, country_to_row};

    fn country(name: &str, population: u64) -> Row {
        country_to_row(&Country {
            population: Some(population),
            ..Country::named(name)
        })
    }

    #[test]
    fn insert_header_above_existing_rows() {
        let mut sheet = Worksheet::default();
        sheet.append_row(country("Peru", 32_971_846));
        sheet
            .insert_row(Row::new(vec![Cell::from("Name")]), 1)
            .expect("insert");

        assert_eq!(sheet.len(), 2);
        assert_eq!(sheet.rows[0].get(0), Some(&Cell::from("Name")));
    }

    #[test]
    fn insert_rejects_out_of_range_index() {
        let mut sheet = Worksheet::default();
        assert!(sheet.insert_row(Row::default(), 0).is_err());
        assert!(sheet.insert_row(Row::default(), 2).is_err());
        assert!(sheet.insert_row(Row::default(), 1).is_ok());
    }

    #[test]
    fn sort_rejects_column_outside_width() {
        let mut sheet = Worksheet::default();
        sheet.append_row(Row::new(vec![Cell::from("narrow")]));
        let err = sheet.sort(&SortSpec::default());
        assert!(matches!(
            err,
            Err(PopsheetError::ColumnOutOfRange { column: 5, width: 1 })
        ));
    }

    #[test]
    fn sort_by_population() {
        let mut sheet = Worksheet::default();
        sheet.append_row(crate::header_row(&Column::default_labels()).expect("header"));
        sheet.append_rows([
            country("Malta", 525_285),
            country("Brazil", 212_559_409),
            country("Fiji", 896_444),
        ]);

        sheet.sort(&SortSpec::default()).expect("sort");

        let populations: Vec<_> = sheet.rows[1..]
            .iter()
            .filter_map(|r| r.get(Column::Population.index()).cloned())
            .collect();
        assert_eq!(
            populations,
            vec![
                Cell::Number(212_559_409),
                Cell::Number(896_444),
                Cell::Number(525_285)
            ]
        );
        assert_eq!(sheet.width(), COLUMN_COUNT);
    }

    #[test]
    fn save_and_load_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("sheet.json");

        let mut sheet = Worksheet::new("feeds");
        sheet.append_row(country("Nepal", 29_136_808));
        sheet.save(&path).expect("save");

        let loaded = Worksheet::load(&path).expect("load");
        assert_eq!(loaded, sheet);
    }

    #[test]
    fn load_missing_file_is_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let loaded = Worksheet::load(&dir.path().join("absent.json")).expect("load");
        assert!(loaded.is_empty());
        assert_eq!(loaded.title, DEFAULT_TITLE);
    }
}
