//! # popsheet-core
//!
//! The pure half of popsheet.
//!
//! This crate knows what a country record looks like, how it becomes a
//! fixed-width spreadsheet row, and how a worksheet is sorted. It never
//! touches the network; the `popsheet` binary owns every HTTP call.
//!
//! ## Modules
//!
//! - `types` - `Country`, `Cell`, `Row`, `PopsheetError`
//! - `columns` - the seven output columns and record-to-row mapping
//! - `sort` - spreadsheet-style ordering of rows
//! - `table` - an in-memory worksheet with JSON persistence
//! - `config` - TOML configuration

// =============================================================================
// MODULES
// =============================================================================

pub mod columns;
pub mod config;
pub mod sort;
pub mod table;
pub mod types;

// =============================================================================
// RE-EXPORTS
// =============================================================================

pub use columns::{COLUMN_COUNT, Column, country_to_row, format_latlng, header_row};
pub use config::{Config, SheetConfig, SortConfig, SourceConfig, WriteConfig, WriteMode};
pub use sort::{SortOrder, SortSpec, sort_rows};
pub use table::Worksheet;
pub use types::{Cell, Country, PopsheetError, Row};
