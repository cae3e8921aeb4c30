//! # popsheet
//!
//! Library half of the popsheet binary. Everything that performs I/O lives
//! here; `popsheet-core` supplies the records, rows and sorting.
//!
//! ```text
//! countries API ──▶ CountriesClient ──▶ Pipeline ──▶ SheetSink
//!                                          │           ├─ RemoteSheet (Sheets API)
//!                                          │           └─ LocalSheet  (JSON file)
//!                                          └─ Pacer (governor)
//! ```

pub mod countries;
pub mod error;
pub mod pipeline;
pub mod sheets;
pub mod sink;

pub use countries::CountriesClient;
pub use error::ClientError;
pub use pipeline::{Pacer, Pipeline, RunReport};
pub use sheets::{SheetsClient, SpreadsheetRef, TokenSource, WorksheetRef};
pub use sink::{LocalSheet, RemoteSheet, SheetSink};
