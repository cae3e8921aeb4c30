//! # Countries Client
//!
//! Fetches the full country list from the REST Countries API.

use crate::ClientError;
use popsheet_core::Country;
use std::time::Duration;

/// HTTP client for the countries endpoint.
#[derive(Clone)]
pub struct CountriesClient {
    http: reqwest::Client,
    url: String,
}

impl CountriesClient {
    /// Create a client for the given endpoint URL.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::ConnectionFailed(e.to_string()))?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }

    /// GET the endpoint and decode every record.
    pub async fn fetch_all(&self) -> Result<Vec<Country>, ClientError> {
        tracing::debug!("GET {}", self.url);
        let resp = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|e| ClientError::ConnectionFailed(format!("{}: {e}", self.url)))?;
        let resp = ClientError::check(resp).await?;
        let countries: Vec<Country> = resp
            .json()
            .await
            .map_err(|e| ClientError::ParseError(e.to_string()))?;
        tracing::info!("Fetched {} countries", countries.len());
        Ok(countries)
    }
}
