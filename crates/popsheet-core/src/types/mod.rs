//! # Core Type Definitions
//!
//! This module contains the types shared by every layer of popsheet:
//! - The incoming record (`Country`)
//! - The outgoing spreadsheet shapes (`Cell`, `Row`)
//! - Error types (`PopsheetError`)
//!
//! ## Wire Format
//!
//! `Country` follows the REST Countries v2 field names (`alpha2Code`,
//! `latlng`, ...). `Cell` serializes untagged, so a row becomes a plain JSON
//! array such as `["Korea", 51780579, null]`. That is the shape the Sheets
//! values API accepts and the shape the local worksheet file stores.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// COUNTRY RECORD
// =============================================================================

/// One record returned by the countries API.
///
/// Every field is optional on the wire. A record with a missing field still
/// deserializes; the gap shows up as an empty cell in the output row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Country {
    /// Common English name.
    #[serde(default)]
    pub name: Option<String>,
    /// ISO 3166-1 alpha-2 code.
    #[serde(default)]
    pub alpha2_code: Option<String>,
    /// ISO 3166-1 alpha-3 code.
    #[serde(default)]
    pub alpha3_code: Option<String>,
    /// Continent-level region ("Asia", "Europe", ...).
    #[serde(default)]
    pub region: Option<String>,
    /// Finer-grained region ("Eastern Asia", ...).
    #[serde(default)]
    pub subregion: Option<String>,
    /// Head count.
    #[serde(default)]
    pub population: Option<u64>,
    /// Latitude and longitude, kept as JSON numbers so they print unchanged.
    #[serde(default)]
    pub latlng: Option<Vec<serde_json::Number>>,
}

impl Country {
    /// Create a record with only a name set.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }
}

// =============================================================================
// CELLS & ROWS
// =============================================================================

/// A single spreadsheet cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    /// A non-negative integer. Written as a JSON number.
    Number(u64),
    /// Free text.
    Text(String),
    /// No value. Written as JSON `null`.
    Empty,
}

impl Cell {
    /// Build a text cell, or `Empty` when there is no value.
    #[must_use]
    pub fn text_or_empty(value: Option<&str>) -> Self {
        match value {
            Some(s) => Self::Text(s.to_string()),
            None => Self::Empty,
        }
    }

    /// Build a number cell, or `Empty` when there is no value.
    #[must_use]
    pub fn number_or_empty(value: Option<u64>) -> Self {
        value.map_or(Self::Empty, Self::Number)
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<u64> for Cell {
    fn from(value: u64) -> Self {
        Self::Number(value)
    }
}

/// An ordered list of cells, left to right.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row(pub Vec<Cell>);

impl Row {
    #[must_use]
    pub fn new(cells: Vec<Cell>) -> Self {
        Self(cells)
    }

    /// Number of cells in the row.
    #[must_use]
    pub fn width(&self) -> usize {
        self.0.len()
    }

    /// Cell at a 0-based column, if the row is that wide.
    #[must_use]
    pub fn get(&self, column: usize) -> Option<&Cell> {
        self.0.get(column)
    }

    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.0
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in popsheet.
///
/// - No silent failures
/// - Use `Result<T, PopsheetError>` for fallible operations
/// - Remote failures are flattened into `Remote` at the app boundary
#[derive(Debug, Error)]
pub enum PopsheetError {
    /// The configuration is incomplete or inconsistent.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A row cannot be placed where it was asked to go.
    #[error("Invalid row: {0}")]
    InvalidRow(String),

    /// A sort or lookup referenced a column the worksheet does not have.
    #[error("Column {column} is out of range for width {width}")]
    ColumnOutOfRange { column: usize, width: usize },

    /// A serialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A deserialization error occurred.
    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),

    /// A remote API call failed.
    #[error("Remote error: {0}")]
    Remote(String),
}

// =============================================================================
// TESTS
// =============================================================================
