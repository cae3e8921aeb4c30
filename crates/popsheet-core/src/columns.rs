//! # Output Columns
//!
//! The fixed seven-column layout every country row is written in, and the
//! mapping from a `Country` record onto it.
//!
//! | # | Column     | Cell     |
//! |---|------------|----------|
//! | A | name       | text     |
//! | B | alpha2     | text     |
//! | C | alpha3     | text     |
//! | D | region     | text     |
//! | E | subregion  | text     |
//! | F | population | number   |
//! | G | latlng     | "lat,lng"|

use crate::{Cell, Country, PopsheetError, Row};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Width of every row popsheet writes.
pub const COLUMN_COUNT: usize = 7;

// =============================================================================
// COLUMN
// =============================================================================

/// One of the seven output columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Column {
    Name,
    Alpha2,
    Alpha3,
    Region,
    Subregion,
    Population,
    LatLng,
}

impl Column {
    /// All columns in output order.
    pub const ALL: [Self; COLUMN_COUNT] = [
        Self::Name,
        Self::Alpha2,
        Self::Alpha3,
        Self::Region,
        Self::Subregion,
        Self::Population,
        Self::LatLng,
    ];

    /// 0-based position in the row.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Spreadsheet column letter (`A` for the first column).
    #[must_use]
    pub const fn letter(self) -> char {
        (b'A' + self as u8) as char
    }

    /// Config-file name of the column.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Alpha2 => "alpha2",
            Self::Alpha3 => "alpha3",
            Self::Region => "region",
            Self::Subregion => "subregion",
            Self::Population => "population",
            Self::LatLng => "latlng",
        }
    }

    /// Header label used when the config does not override it.
    #[must_use]
    pub const fn default_label(self) -> &'static str {
        match self {
            Self::Name => "Name",
            Self::Alpha2 => "Alpha-2 Code",
            Self::Alpha3 => "Alpha-3 Code",
            Self::Region => "Region",
            Self::Subregion => "Subregion",
            Self::Population => "Population",
            Self::LatLng => "Lat, Lng",
        }
    }

    /// Default header labels, in column order.
    #[must_use]
    pub fn default_labels() -> Vec<String> {
        Self::ALL
            .iter()
            .map(|c| c.default_label().to_string())
            .collect()
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Column {
    type Err = PopsheetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| c.key() == wanted)
            .ok_or_else(|| PopsheetError::InvalidConfig(format!("Unknown column: {}", s)))
    }
}

impl TryFrom<String> for Column {
    type Error = PopsheetError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Column> for String {
    fn from(value: Column) -> Self {
        value.key().to_string()
    }
}

// =============================================================================
// MAPPING
// =============================================================================

/// Map a country record onto the seven output columns.
#[must_use]
pub fn country_to_row(country: &Country) -> Row {
    Row::new(vec![
        Cell::text_or_empty(country.name.as_deref()),
        Cell::text_or_empty(country.alpha2_code.as_deref()),
        Cell::text_or_empty(country.alpha3_code.as_deref()),
        Cell::text_or_empty(country.region.as_deref()),
        Cell::text_or_empty(country.subregion.as_deref()),
        Cell::number_or_empty(country.population),
        format_latlng(country.latlng.as_deref()),
    ])
}

/// Join coordinates as `lat,lng` with no spaces.
///
/// Each number prints the way JSON prints it, so `33.0` stays `33.0`.
#[must_use]
pub fn format_latlng(values: Option<&[serde_json::Number]>) -> Cell {
    match values {
        None => Cell::Empty,
        Some(coords) => Cell::Text(
            coords
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(","),
        ),
    }
}

/// Build the header row from exactly `COLUMN_COUNT` labels.
pub fn header_row(labels: &[String]) -> Result<Row, PopsheetError> {
    if labels.len() != COLUMN_COUNT {
        return Err(PopsheetError::InvalidConfig(format!(
            "Header needs {} labels, got {}",
            COLUMN_COUNT,
            labels.len()
        )));
    }
    Ok(Row::new(
        labels.iter().map(|l| Cell::Text(l.clone())).collect(),
    ))
}

// =============================================================================
// TESTS
// =============================================================================
