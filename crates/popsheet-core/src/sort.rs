//! # Row Sorting
//!
//! Spreadsheet-style ordering for worksheet rows.
//!
//! The order matches what the Sheets `sortRange` request produces, so a
//! local worksheet and a remote one end up with rows in the same order:
//! - numbers sort before text
//! - text compares lexicographically
//! - empty cells go last in both directions
//! - ties keep their original relative order (stable)

use crate::{Cell, Column, PopsheetError, Row};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

// =============================================================================
// SORT ORDER
// =============================================================================

/// Direction of a sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    #[serde(rename = "asc", alias = "ascending")]
    Ascending,
    #[serde(rename = "desc", alias = "descending")]
    Descending,
}

impl SortOrder {
    /// Name used by the Sheets API (`ASCENDING` / `DESCENDING`).
    #[must_use]
    pub const fn api_name(self) -> &'static str {
        match self {
            Self::Ascending => "ASCENDING",
            Self::Descending => "DESCENDING",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ascending => f.write_str("asc"),
            Self::Descending => f.write_str("desc"),
        }
    }
}

impl FromStr for SortOrder {
    type Err = PopsheetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Ascending),
            "desc" | "descending" => Ok(Self::Descending),
            other => Err(PopsheetError::InvalidConfig(format!(
                "Unknown sort order: {}",
                other
            ))),
        }
    }
}

// =============================================================================
// SORT SPEC
// =============================================================================

/// What to sort on and which leading rows to leave alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub column: Column,
    pub order: SortOrder,
    /// Leading rows excluded from the sort (the header).
    pub skip_rows: usize,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self {
            column: Column::Population,
            order: SortOrder::Descending,
            skip_rows: 1,
        }
    }
}

// =============================================================================
// COMPARISON
// =============================================================================

/// Rank of a cell kind: numbers, then text. Empty is handled separately.
fn kind_rank(cell: &Cell) -> u8 {
    match cell {
        Cell::Number(_) => 0,
        Cell::Text(_) => 1,
        Cell::Empty => 2,
    }
}

/// Ascending comparison of two non-empty cells.
fn compare_values(a: &Cell, b: &Cell) -> Ordering {
    match (a, b) {
        (Cell::Number(x), Cell::Number(y)) => x.cmp(y),
        (Cell::Text(x), Cell::Text(y)) => x.cmp(y),
        _ => kind_rank(a).cmp(&kind_rank(b)),
    }
}

/// Compare two cells for the given direction. Empty cells always sort last.
pub fn compare_cells(a: &Cell, b: &Cell, order: SortOrder) -> Ordering {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => match order {
            SortOrder::Ascending => compare_values(a, b),
            SortOrder::Descending => compare_values(b, a),
        },
    }
}

/// Sort rows in place, leaving the first `spec.skip_rows` rows untouched.
///
/// Rows narrower than the sort column are treated as having an empty cell
/// there.
pub fn sort_rows(rows: &mut [Row], spec: &SortSpec) {
    if spec.skip_rows >= rows.len() {
        return;
    }
    let column = spec.column.index();
    rows[spec.skip_rows..].sort_by(|a, b| {
        let left = a.get(column).unwrap_or(&Cell::Empty);
        let right = b.get(column).unwrap_or(&Cell::Empty);
        compare_cells(left, right, spec.order)
    });
}

// =============================================================================
// TESTS
// =============================================================================
