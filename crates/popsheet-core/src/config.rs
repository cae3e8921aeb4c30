//! # Configuration
//!
//! popsheet reads a TOML file with four optional sections:
//!
//! ```toml
//! [source]
//! url = "https://restcountries.com/v2/all?fields=..."
//!
//! [sheet]
//! spreadsheet = "feeds"
//! credentials = "client_secret.json"
//!
//! [write]
//! mode = "row"
//! delay_ms = 1000
//!
//! [sort]
//! column = "population"
//! order = "desc"
//! ```
//!
//! Every key has a default, so an empty file is a valid config.
//! Environment overrides are applied through [`Config::with_env`], which
//! takes the lookup function as an argument instead of reading the process
//! environment itself.

use crate::{Column, PopsheetError, SortOrder, SortSpec, columns::COLUMN_COUNT};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// =============================================================================
// DEFAULTS
// =============================================================================

/// REST Countries v2 endpoint, restricted to the fields popsheet writes.
pub const DEFAULT_SOURCE_URL: &str = "https://restcountries.com/v2/all?fields=name,alpha2Code,alpha3Code,region,subregion,population,latlng";

pub const DEFAULT_SHEETS_API: &str = "https://sheets.googleapis.com";
pub const DEFAULT_DRIVE_API: &str = "https://www.googleapis.com";
pub const DEFAULT_SPREADSHEET: &str = "feeds";
pub const DEFAULT_CREDENTIALS: &str = "client_secret.json";

/// Pause between single-row appends.
pub const DEFAULT_DELAY_MS: u64 = 1000;

/// Upper bound for `sort.skip_rows`. The sheet holds a single header row.
pub const MAX_SKIP_ROWS: usize = 100;

// =============================================================================
// SECTIONS
// =============================================================================

/// `[source]`: where country records come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub url: String,
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_SOURCE_URL.to_string(),
            timeout_secs: 30,
        }
    }
}

/// `[sheet]`: which spreadsheet to write and how to authenticate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetConfig {
    /// Spreadsheet title, looked up through the Drive API.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spreadsheet: Option<String>,
    /// Spreadsheet id. Takes precedence over the title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spreadsheet_id: Option<String>,
    /// 0-based worksheet index.
    pub worksheet: usize,
    /// Service-account key file.
    pub credentials: PathBuf,
    pub sheets_api: String,
    pub drive_api: String,
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            spreadsheet: Some(DEFAULT_SPREADSHEET.to_string()),
            spreadsheet_id: None,
            worksheet: 0,
            credentials: PathBuf::from(DEFAULT_CREDENTIALS),
            sheets_api: DEFAULT_SHEETS_API.to_string(),
            drive_api: DEFAULT_DRIVE_API.to_string(),
        }
    }
}

/// How rows reach the spreadsheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    /// One append request per country, paced by `delay_ms`.
    #[default]
    Row,
    /// A single append request carrying every row.
    Batch,
}

/// `[write]`: pacing, retries and the header row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriteConfig {
    pub mode: WriteMode,
    pub delay_ms: u64,
    /// Retries for a request answered with 429 or 5xx.
    pub max_retries: u32,
    /// First retry wait; doubles on each further retry.
    pub backoff_ms: u64,
    pub header: Vec<String>,
}

impl Default for WriteConfig {
    fn default() -> Self {
        Self {
            mode: WriteMode::Row,
            delay_ms: DEFAULT_DELAY_MS,
            max_retries: 5,
            backoff_ms: 1000,
            header: Column::default_labels(),
        }
    }
}

/// `[sort]`: the sort requested after all rows are written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SortConfig {
    pub enabled: bool,
    pub column: Column,
    pub order: SortOrder,
    pub skip_rows: usize,
}

impl Default for SortConfig {
    fn default() -> Self {
        let spec = SortSpec::default();
        Self {
            enabled: true,
            column: spec.column,
            order: spec.order,
            skip_rows: spec.skip_rows,
        }
    }
}

impl SortConfig {
    #[must_use]
    pub fn spec(&self) -> SortSpec {
        SortSpec {
            column: self.column,
            order: self.order,
            skip_rows: self.skip_rows,
        }
    }
}

// =============================================================================
// CONFIG
// =============================================================================

/// The whole configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub source: SourceConfig,
    pub sheet: SheetConfig,
    pub write: WriteConfig,
    pub sort: SortConfig,
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Self, PopsheetError> {
        toml::from_str(s).map_err(|e| PopsheetError::InvalidConfig(e.to_string()))
    }

    pub fn to_toml_string(&self) -> Result<String, PopsheetError> {
        toml::to_string(self).map_err(|e| PopsheetError::SerializationError(e.to_string()))
    }

    /// Read and parse a config file.
    pub fn load(path: &Path) -> Result<Self, PopsheetError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            PopsheetError::IoError(format!("Cannot read config {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&contents)
    }

    /// Apply `POPSHEET_*` overrides using the given lookup.
    ///
    /// Recognised keys: `POPSHEET_SOURCE_URL`, `POPSHEET_SPREADSHEET`,
    /// `POPSHEET_SPREADSHEET_ID`, `POPSHEET_CREDENTIALS`, `POPSHEET_DELAY_MS`.
    pub fn with_env<F>(mut self, lookup: F) -> Result<Self, PopsheetError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get("POPSHEET_SOURCE_URL") {
            self.source.url = url;
        }
        if let Some(title) = get("POPSHEET_SPREADSHEET") {
            self.sheet.spreadsheet = Some(title);
        }
        if let Some(id) = get("POPSHEET_SPREADSHEET_ID") {
            self.sheet.spreadsheet_id = Some(id);
        }
        if let Some(path) = get("POPSHEET_CREDENTIALS") {
            self.sheet.credentials = PathBuf::from(path);
        }
        if let Some(delay) = get("POPSHEET_DELAY_MS") {
            self.write.delay_ms = delay.trim().parse().map_err(|_| {
                PopsheetError::InvalidConfig(format!("POPSHEET_DELAY_MS is not a number: {}", delay))
            })?;
        }
        Ok(self)
    }

    /// Check the settings hang together before any request is made.
    pub fn validate(&self) -> Result<(), PopsheetError> {
        if self.source.url.trim().is_empty() {
            return Err(PopsheetError::InvalidConfig(
                "source.url must not be empty".to_string(),
            ));
        }
        if self.source.timeout_secs == 0 {
            return Err(PopsheetError::InvalidConfig(
                "source.timeout_secs must be positive".to_string(),
            ));
        }
        let has_title = self
            .sheet
            .spreadsheet
            .as_deref()
            .is_some_and(|t| !t.trim().is_empty());
        let has_id = self
            .sheet
            .spreadsheet_id
            .as_deref()
            .is_some_and(|t| !t.trim().is_empty());
        if !has_title && !has_id {
            return Err(PopsheetError::InvalidConfig(
                "sheet.spreadsheet or sheet.spreadsheet_id is required".to_string(),
            ));
        }
        if self.sheet.sheets_api.trim().is_empty() || self.sheet.drive_api.trim().is_empty() {
            return Err(PopsheetError::InvalidConfig(
                "sheet.sheets_api and sheet.drive_api must not be empty".to_string(),
            ));
        }
        if self.write.header.len() != COLUMN_COUNT {
            return Err(PopsheetError::InvalidConfig(format!(
                "write.header needs {} labels, got {}",
                COLUMN_COUNT,
                self.write.header.len()
            )));
        }
        if self.sort.enabled {
            // Row 1 is always the header, so it must stay out of the sort.
            if self.sort.skip_rows == 0 {
                return Err(PopsheetError::InvalidConfig(
                    "sort.skip_rows must be at least 1 to keep the header row in place"
                        .to_string(),
                ));
            }
            if self.sort.skip_rows > MAX_SKIP_ROWS {
                return Err(PopsheetError::InvalidConfig(format!(
                    "sort.skip_rows must be at most {}, got {}",
                    MAX_SKIP_ROWS, self.sort.skip_rows
                )));
            }
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_default() {
        let config = Config::from_toml_str("").expect("parse");
        assert_eq!(config, Config::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_sections_fill_defaults() {
        let config = Config::from_toml_str(
            r#"
            [sheet]
            spreadsheet_id = "1AbC"

            [write]
            mode = "batch"

            [sort]
            column = "name"
            order = "asc"
            "#,
        )
        .expect("parse");

        assert_eq!(config.sheet.spreadsheet_id.as_deref(), Some("1AbC"));
        assert_eq!(config.sheet.spreadsheet.as_deref(), Some(DEFAULT_SPREADSHEET));
        assert_eq!(config.write.mode, WriteMode::Batch);
        assert_eq!(config.write.delay_ms, DEFAULT_DELAY_MS);
        assert_eq!(config.sort.spec().column, Column::Name);
        assert_eq!(config.sort.spec().order, SortOrder::Ascending);
        assert_eq!(config.sort.spec().skip_rows, 1);
    }

    #[test]
    fn unknown_column_is_rejected() {
        let err = Config::from_toml_str("[sort]\ncolumn = \"gdp\"\n");
        assert!(matches!(err, Err(PopsheetError::InvalidConfig(_))));
    }

    #[test]
    fn toml_output_parses_back() {
        let config = Config::default();
        let text = config.to_toml_string().expect("serialize");
        assert!(text.contains("[write]"));
        assert_eq!(Config::from_toml_str(&text).expect("parse"), config);
    }

    #[test]
    fn env_overrides_apply() {
        let env = |key: &str| match key {
            "POPSHEET_SPREADSHEET" => Some("census".to_string()),
            "POPSHEET_DELAY_MS" => Some("250".to_string()),
            "POPSHEET_SOURCE_URL" => Some("   ".to_string()),
            _ => None,
        };
        let config = Config::default().with_env(env).expect("env");
        assert_eq!(config.sheet.spreadsheet.as_deref(), Some("census"));
        assert_eq!(config.write.delay_ms, 250);
        assert_eq!(config.source.url, DEFAULT_SOURCE_URL);
    }

    #[test]
    fn env_delay_must_be_numeric() {
        let env = |key: &str| (key == "POPSHEET_DELAY_MS").then(|| "soon".to_string());
        assert!(Config::default().with_env(env).is_err());
    }

    #[test]
    fn validate_requires_a_spreadsheet() {
        let mut config = Config::default();
        config.sheet.spreadsheet = None;
        assert!(config.validate().is_err());

        config.sheet.spreadsheet_id = Some("1AbC".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_checks_header_width() {
        let mut config = Config::default();
        config.write.header.pop();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_checks_skip_rows() {
        let mut config = Config::default();
        config.sort.skip_rows = 0;
        assert!(matches!(
            config.validate(),
            Err(PopsheetError::InvalidConfig(_))
        ));

        config.sort.skip_rows = 1_000_000;
        assert!(config.validate().is_err());

        config.sort.skip_rows = MAX_SKIP_ROWS;
        assert!(config.validate().is_ok());

        // Not checked when no sort is requested.
        config.sort.skip_rows = 0;
        config.sort.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("popsheet.toml");
        std::fs::write(&path, "[write]\ndelay_ms = 0\n").expect("write");

        let config = Config::load(&path).expect("load");
        assert_eq!(config.write.delay_ms, 0);
        assert!(Config::load(&dir.path().join("missing.toml")).is_err());
    }
}
