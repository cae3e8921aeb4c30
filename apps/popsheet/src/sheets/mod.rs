//! # Google Sheets Client
//!
//! The spreadsheet operations popsheet needs, on top of the Sheets v4 and
//! Drive v3 REST APIs:
//!
//! - `find_spreadsheet` - Drive search by exact title
//! - `worksheet` - pick a worksheet by index
//! - `insert_row` - `insertDimension` + values update
//! - `append_rows` - `values:append`
//! - `sort_range` - `sortRange`
//!
//! Every request goes through [`SheetsClient::execute`], which attaches the
//! bearer token and retries 429 and 5xx answers with exponential backoff.

pub mod auth;
pub mod types;

pub use auth::{ServiceAccountAuth, ServiceAccountKey, TokenSource};

use crate::ClientError;
use popsheet_core::{Row, SheetConfig, SortSpec};
use reqwest::{Method, RequestBuilder, Url};
use std::time::Duration;
use types::{
    BatchUpdate, DriveFileList, SpreadsheetMeta, ValueRange, a1_range, insert_rows_request,
    sort_range_request, spreadsheet_query,
};

// =============================================================================
// HANDLES
// =============================================================================

/// A spreadsheet located by id (and title, when it was looked up by one).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpreadsheetRef {
    pub id: String,
    pub title: Option<String>,
}

/// One worksheet inside a spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorksheetRef {
    pub spreadsheet_id: String,
    pub sheet_id: i64,
    pub title: String,
    pub index: usize,
}

// =============================================================================
// RETRY POLICY
// =============================================================================

/// Retries for rate-limited and failed requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            backoff: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Wait before retry number `attempt` (0-based): `backoff * 2^attempt`.
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.backoff.saturating_mul(factor)
    }
}

// =============================================================================
// CLIENT
// =============================================================================

/// HTTP client for the Sheets and Drive APIs.
#[derive(Clone)]
pub struct SheetsClient {
    http: reqwest::Client,
    sheets_api: String,
    drive_api: String,
    auth: TokenSource,
    retry: RetryPolicy,
}

/// Join path segments onto a base URL, percent-encoding each segment.
fn endpoint(base: &str, segments: &[&str]) -> Result<Url, ClientError> {
    let mut url =
        Url::parse(base).map_err(|e| ClientError::ConnectionFailed(format!("{base}: {e}")))?;
    url.path_segments_mut()
        .map_err(|()| ClientError::ConnectionFailed(format!("{base}: not a base URL")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

impl SheetsClient {
    pub fn new(
        http: reqwest::Client,
        sheets_api: impl Into<String>,
        drive_api: impl Into<String>,
        auth: TokenSource,
    ) -> Self {
        Self {
            http,
            sheets_api: sheets_api.into(),
            drive_api: drive_api.into(),
            auth,
            retry: RetryPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Send a request with bearer auth, retrying 429 and 5xx answers.
    ///
    /// `build` is called once per attempt since a sent request is consumed.
    pub async fn execute<F>(
        &self,
        method: Method,
        url: Url,
        build: F,
    ) -> Result<reqwest::Response, ClientError>
    where
        F: Fn(RequestBuilder) -> RequestBuilder,
    {
        let mut attempt = 0;
        loop {
            let token = self.auth.token().await?;
            tracing::debug!("{} {}", method, url);
            let req = build(self.http.request(method.clone(), url.clone())).bearer_auth(token);

            let result = match req.send().await {
                Ok(resp) => ClientError::check(resp).await,
                Err(e) => Err(ClientError::ConnectionFailed(format!("{url}: {e}"))),
            };

            match result {
                Err(e) if e.is_retryable() && attempt < self.retry.max_retries => {
                    let wait = self.retry.delay(attempt);
                    tracing::warn!(
                        "{} {} failed ({}), retry {}/{} in {:?}",
                        method,
                        url.path(),
                        e,
                        attempt + 1,
                        self.retry.max_retries,
                        wait
                    );
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    async fn batch_update(
        &self,
        spreadsheet_id: &str,
        requests: Vec<serde_json::Value>,
    ) -> Result<(), ClientError> {
        let url = endpoint(
            &self.sheets_api,
            &["v4", "spreadsheets", &format!("{spreadsheet_id}:batchUpdate")],
        )?;
        let body = BatchUpdate { requests };
        self.execute(Method::POST, url, |req| req.json(&body)).await?;
        Ok(())
    }

    // =========================================================================
    // LOOKUP
    // =========================================================================

    /// Find a spreadsheet by its exact title.
    ///
    /// When several spreadsheets share the title, the first one Drive
    /// returns is used.
    pub async fn find_spreadsheet(&self, title: &str) -> Result<SpreadsheetRef, ClientError> {
        let url = endpoint(&self.drive_api, &["drive", "v3", "files"])?;
        let query = spreadsheet_query(title);
        let resp = self
            .execute(Method::GET, url, |req| {
                req.query(&[
                    ("q", query.as_str()),
                    ("fields", "files(id,name)"),
                    ("pageSize", "10"),
                ])
            })
            .await?;
        let list: DriveFileList = resp
            .json()
            .await
            .map_err(|e| ClientError::ParseError(e.to_string()))?;

        if list.files.len() > 1 {
            tracing::warn!(
                "{} spreadsheets are titled '{}', using the first",
                list.files.len(),
                title
            );
        }
        list.files
            .into_iter()
            .next()
            .map(|f| SpreadsheetRef {
                id: f.id,
                title: Some(f.name),
            })
            .ok_or_else(|| ClientError::SpreadsheetNotFound(title.to_string()))
    }

    /// Resolve the worksheet at a 0-based index.
    pub async fn worksheet(
        &self,
        spreadsheet_id: &str,
        index: usize,
    ) -> Result<WorksheetRef, ClientError> {
        let url = endpoint(&self.sheets_api, &["v4", "spreadsheets", spreadsheet_id])?;
        let resp = self
            .execute(Method::GET, url, |req| {
                req.query(&[("fields", "sheets.properties(sheetId,title,index)")])
            })
            .await?;
        let meta: SpreadsheetMeta = resp
            .json()
            .await
            .map_err(|e| ClientError::ParseError(e.to_string()))?;

        let count = meta.sheets.len();
        let mut sheets: Vec<_> = meta.sheets.into_iter().map(|s| s.properties).collect();
        sheets.sort_by_key(|p| p.index);
        sheets
            .into_iter()
            .nth(index)
            .map(|p| WorksheetRef {
                spreadsheet_id: spreadsheet_id.to_string(),
                sheet_id: p.sheet_id,
                title: p.title,
                index,
            })
            .ok_or(ClientError::WorksheetNotFound { index, count })
    }

    /// Resolve the configured spreadsheet and worksheet.
    pub async fn open(&self, config: &SheetConfig) -> Result<WorksheetRef, ClientError> {
        let spreadsheet_id = match config.spreadsheet_id.as_deref() {
            Some(id) if !id.trim().is_empty() => id.to_string(),
            _ => {
                let title = config.spreadsheet.as_deref().unwrap_or_default();
                self.find_spreadsheet(title).await?.id
            }
        };
        let ws = self.worksheet(&spreadsheet_id, config.worksheet).await?;
        tracing::info!(
            "Opened worksheet '{}' of spreadsheet {}",
            ws.title,
            ws.spreadsheet_id
        );
        Ok(ws)
    }

    // =========================================================================
    // ROW OPERATIONS
    // =========================================================================

    /// Insert a row at a 1-based row index, shifting the rest down.
    ///
    /// Row 0 does not exist and is refused before any request is sent.
    pub async fn insert_row(
        &self,
        ws: &WorksheetRef,
        row: &Row,
        at: usize,
    ) -> Result<(), ClientError> {
        let Some(start) = at.checked_sub(1) else {
            return Err(ClientError::InvalidRequest(
                "row index is 1-based, got 0".to_string(),
            ));
        };
        self.batch_update(
            &ws.spreadsheet_id,
            vec![insert_rows_request(ws.sheet_id, start, 1)],
        )
        .await?;

        let range = a1_range(&ws.title, &format!("A{at}"));
        let url = endpoint(
            &self.sheets_api,
            &["v4", "spreadsheets", &ws.spreadsheet_id, "values", &range],
        )?;
        let body = ValueRange::rows(range, vec![row.clone()]);
        self.execute(Method::PUT, url, |req| {
            req.query(&[("valueInputOption", "RAW")]).json(&body)
        })
        .await?;
        Ok(())
    }

    /// Append rows after the last row of the worksheet's table.
    pub async fn append_rows(&self, ws: &WorksheetRef, rows: &[Row]) -> Result<(), ClientError> {
        let range = a1_range(&ws.title, "A1");
        let url = endpoint(
            &self.sheets_api,
            &[
                "v4",
                "spreadsheets",
                &ws.spreadsheet_id,
                "values",
                &format!("{range}:append"),
            ],
        )?;
        let body = ValueRange::rows(range, rows.to_vec());
        self.execute(Method::POST, url, |req| {
            req.query(&[
                ("valueInputOption", "RAW"),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .json(&body)
        })
        .await?;
        Ok(())
    }

    pub async fn append_row(&self, ws: &WorksheetRef, row: &Row) -> Result<(), ClientError> {
        self.append_rows(ws, std::slice::from_ref(row)).await
    }

    /// Sort the worksheet over columns `0..width`, skipping header rows.
    pub async fn sort_range(
        &self,
        ws: &WorksheetRef,
        spec: &SortSpec,
        width: usize,
    ) -> Result<(), ClientError> {
        self.batch_update(
            &ws.spreadsheet_id,
            vec![sort_range_request(ws.sheet_id, spec, width)],
        )
        .await
    }
}

// =============================================================================
// TESTS
// =============================================================================
