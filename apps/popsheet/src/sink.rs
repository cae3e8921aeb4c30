//! # Sheet Sinks
//!
//! The pipeline writes through the [`SheetSink`] trait so the same run can
//! target a Google spreadsheet or a JSON file on disk.
//!
//! - [`RemoteSheet`] - one worksheet of a Google spreadsheet
//! - [`LocalSheet`] - a [`Worksheet`] saved after every change

use crate::sheets::{SheetsClient, WorksheetRef};
use popsheet_core::{PopsheetError, Row, SortSpec, Worksheet};
use std::path::{Path, PathBuf};

/// Destination for header, rows and the final sort.
#[allow(async_fn_in_trait)]
pub trait SheetSink {
    /// Human-readable name of the destination.
    fn describe(&self) -> String;

    /// Insert a row at a 1-based index.
    async fn insert_row(&mut self, row: Row, at: usize) -> Result<(), PopsheetError>;

    async fn append_row(&mut self, row: Row) -> Result<(), PopsheetError>;

    async fn append_rows(&mut self, rows: Vec<Row>) -> Result<(), PopsheetError>;

    /// Sort columns `0..width`.
    async fn sort(&mut self, spec: &SortSpec, width: usize) -> Result<(), PopsheetError>;
}

// =============================================================================
// REMOTE
// =============================================================================

/// A worksheet of a Google spreadsheet.
pub struct RemoteSheet {
    client: SheetsClient,
    worksheet: WorksheetRef,
}

impl RemoteSheet {
    #[must_use]
    pub fn new(client: SheetsClient, worksheet: WorksheetRef) -> Self {
        Self { client, worksheet }
    }

    #[must_use]
    pub fn worksheet(&self) -> &WorksheetRef {
        &self.worksheet
    }
}

impl SheetSink for RemoteSheet {
    fn describe(&self) -> String {
        format!(
            "spreadsheet {} / worksheet '{}'",
            self.worksheet.spreadsheet_id, self.worksheet.title
        )
    }

    async fn insert_row(&mut self, row: Row, at: usize) -> Result<(), PopsheetError> {
        Ok(self.client.insert_row(&self.worksheet, &row, at).await?)
    }

    async fn append_row(&mut self, row: Row) -> Result<(), PopsheetError> {
        Ok(self.client.append_row(&self.worksheet, &row).await?)
    }

    async fn append_rows(&mut self, rows: Vec<Row>) -> Result<(), PopsheetError> {
        Ok(self.client.append_rows(&self.worksheet, &rows).await?)
    }

    async fn sort(&mut self, spec: &SortSpec, width: usize) -> Result<(), PopsheetError> {
        Ok(self.client.sort_range(&self.worksheet, spec, width).await?)
    }
}

// =============================================================================
// LOCAL
// =============================================================================

/// A worksheet kept in a JSON file.
pub struct LocalSheet {
    path: PathBuf,
    sheet: Worksheet,
}

impl LocalSheet {
    /// Open the file, starting empty if it does not exist yet.
    pub fn open(path: &Path) -> Result<Self, PopsheetError> {
        Ok(Self {
            path: path.to_path_buf(),
            sheet: Worksheet::load(path)?,
        })
    }

    #[must_use]
    pub fn worksheet(&self) -> &Worksheet {
        &self.sheet
    }
}

impl SheetSink for LocalSheet {
    fn describe(&self) -> String {
        format!("local worksheet {}", self.path.display())
    }

    async fn insert_row(&mut self, row: Row, at: usize) -> Result<(), PopsheetError> {
        self.sheet.insert_row(row, at)?;
        self.sheet.save(&self.path)
    }

    async fn append_row(&mut self, row: Row) -> Result<(), PopsheetError> {
        self.sheet.append_row(row);
        self.sheet.save(&self.path)
    }

    async fn append_rows(&mut self, rows: Vec<Row>) -> Result<(), PopsheetError> {
        self.sheet.append_rows(rows);
        self.sheet.save(&self.path)
    }

    async fn sort(&mut self, spec: &SortSpec, _width: usize) -> Result<(), PopsheetError> {
        self.sheet.sort(spec)?;
        self.sheet.save(&self.path)
    }
}

// =============================================================================
// TESTS
// =============================================================================
