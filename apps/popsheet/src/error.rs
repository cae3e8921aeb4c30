//! # HTTP Client Errors
//!
//! One error type for every remote call popsheet makes: the countries API,
//! the OAuth token endpoint, Drive and Sheets.

use popsheet_core::PopsheetError;
use thiserror::Error;

/// Errors from the HTTP client layer.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Cannot reach the remote host.
    #[error("Cannot connect to {0}")]
    ConnectionFailed(String),

    /// 401/403 - credentials rejected.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// 429 Too Many Requests.
    #[error("Rate limited: too many requests")]
    RateLimited,

    /// Server returned a 5xx error.
    #[error("Server error ({0}): {1}")]
    ServerError(u16, String),

    /// Any other non-success status.
    #[error("Unexpected status ({0}): {1}")]
    Status(u16, String),

    /// Failed to parse a response body.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Credentials could not be loaded or signed.
    #[error("Auth error: {0}")]
    Auth(String),

    /// No spreadsheet with the requested title is visible to the account.
    #[error("Spreadsheet not found: {0}")]
    SpreadsheetNotFound(String),

    /// The call was rejected before anything was sent.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The spreadsheet has fewer worksheets than the requested index.
    #[error("Worksheet {index} not found (spreadsheet has {count})")]
    WorksheetNotFound { index: usize, count: usize },
}

impl ClientError {
    /// Whether the request may succeed if sent again.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited | Self::ServerError(..))
    }

    /// Turn a non-success response into an error. Success passes through.
    pub async fn check(resp: reqwest::Response) -> Result<reqwest::Response, Self> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(Self::RateLimited);
        }
        let body = resp.text().await.unwrap_or_default();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(Self::Unauthorized(body));
        }
        if status.is_server_error() {
            return Err(Self::ServerError(status.as_u16(), body));
        }
        Err(Self::Status(status.as_u16(), body))
    }
}

impl From<ClientError> for PopsheetError {
    fn from(err: ClientError) -> Self {
        Self::Remote(err.to_string())
    }
}
