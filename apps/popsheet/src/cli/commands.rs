//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use popsheet::{
    CountriesClient, LocalSheet, Pipeline, RemoteSheet, SheetsClient, TokenSource,
    sheets::RetryPolicy,
};
use popsheet_core::{Config, PopsheetError, WriteMode};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file read when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "popsheet.toml";

/// Env var holding a ready-made bearer token.
const ACCESS_TOKEN_ENV: &str = "POPSHEET_ACCESS_TOKEN";

// =============================================================================
// SHARED SETUP
// =============================================================================

/// Load the config file, apply env overrides and validate.
///
/// An explicit path must exist. The default path is optional; defaults
/// apply when it is missing.
fn load_config(path: Option<&Path>) -> Result<Config, PopsheetError> {
    load_config_with(path, |key| std::env::var(key).ok())
}

fn load_config_with<F>(path: Option<&Path>, env: F) -> Result<Config, PopsheetError>
where
    F: Fn(&str) -> Option<String>,
{
    let config = match path {
        Some(explicit) => Config::load(explicit)?,
        None => {
            let default_path = Path::new(DEFAULT_CONFIG_PATH);
            if default_path.exists() {
                Config::load(default_path)?
            } else {
                tracing::debug!("No {} found, using defaults", DEFAULT_CONFIG_PATH);
                Config::default()
            }
        }
    };
    let config = config.with_env(env)?;
    config.validate()?;
    Ok(config)
}

fn countries_client(config: &Config) -> Result<CountriesClient, PopsheetError> {
    Ok(CountriesClient::new(
        config.source.url.clone(),
        Duration::from_secs(config.source.timeout_secs),
    )?)
}

/// Pick the token source: `POPSHEET_ACCESS_TOKEN` wins over the key file.
fn token_source(config: &Config, http: &reqwest::Client) -> Result<TokenSource, PopsheetError> {
    if let Some(token) = std::env::var(ACCESS_TOKEN_ENV)
        .ok()
        .filter(|t| !t.trim().is_empty())
    {
        return Ok(TokenSource::Static(token));
    }
    Ok(TokenSource::from_key_file(
        &config.sheet.credentials,
        http.clone(),
    )?)
}

fn sheets_client(config: &Config) -> Result<SheetsClient, PopsheetError> {
    let http = reqwest::Client::new();
    let auth = token_source(config, &http)?;
    tracing::info!("Authenticating with {}", auth.describe());
    Ok(SheetsClient::new(
        http,
        config.sheet.sheets_api.clone(),
        config.sheet.drive_api.clone(),
        auth,
    )
    .with_retry(RetryPolicy {
        max_retries: config.write.max_retries,
        backoff: Duration::from_millis(config.write.backoff_ms),
    }))
}

async fn remote_sheet(config: &Config) -> Result<RemoteSheet, PopsheetError> {
    let client = sheets_client(config)?;
    let worksheet = client.open(&config.sheet).await?;
    Ok(RemoteSheet::new(client, worksheet))
}

fn print_json(value: &serde_json::Value) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_default()
    );
}

// =============================================================================
// RUN COMMAND
// =============================================================================

/// Command-line overrides for `run`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOverrides {
    pub batch: bool,
    pub delay_ms: Option<u64>,
    pub no_sort: bool,
}

impl RunOverrides {
    fn apply(self, config: &mut Config) {
        if self.batch {
            config.write.mode = WriteMode::Batch;
        }
        if let Some(delay) = self.delay_ms {
            config.write.delay_ms = delay;
        }
        if self.no_sort {
            config.sort.enabled = false;
        }
    }
}

/// Fetch, write and sort.
pub async fn cmd_run(
    config_path: Option<&Path>,
    json_mode: bool,
    local: Option<&Path>,
    overrides: RunOverrides,
) -> Result<(), PopsheetError> {
    let mut config = load_config(config_path)?;
    overrides.apply(&mut config);
    let pipeline = Pipeline::from_config(&config)?;

    let countries = countries_client(&config)?.fetch_all().await?;

    let (report, destination) = match local {
        Some(path) => {
            let mut sink = LocalSheet::open(path)?;
            let report = pipeline.run(&countries, &mut sink).await?;
            (report, path.display().to_string())
        }
        None => {
            let mut sink = remote_sheet(&config).await?;
            let report = pipeline.run(&countries, &mut sink).await?;
            (report, sink.worksheet().spreadsheet_id.clone())
        }
    };

    if json_mode {
        print_json(&serde_json::json!({
            "destination": destination,
            "rows_written": report.rows_written,
            "sorted": report.sorted,
            "sort_column": config.sort.column.key(),
            "sort_order": config.sort.order.to_string(),
        }));
        return Ok(());
    }

    println!(
        "Data has been saved to the spreadsheet ({} rows).",
        report.rows_written
    );
    if report.sorted {
        println!("Sorted by {} ({}).", config.sort.column, config.sort.order);
    }
    Ok(())
}

// =============================================================================
// FETCH COMMAND
// =============================================================================

/// Fetch and map rows without writing to a spreadsheet.
pub async fn cmd_fetch(
    config_path: Option<&Path>,
    json_mode: bool,
    output: Option<&Path>,
) -> Result<(), PopsheetError> {
    let config = load_config(config_path)?;
    let countries = countries_client(&config)?.fetch_all().await?;
    let rows = Pipeline::rows_for(&countries);

    if let Some(path) = output {
        let json = serde_json::to_string_pretty(&rows)
            .map_err(|e| PopsheetError::SerializationError(e.to_string()))?;
        std::fs::write(path, json).map_err(|e| {
            PopsheetError::IoError(format!("Cannot write {}: {}", path.display(), e))
        })?;
        if json_mode {
            print_json(&serde_json::json!({
                "output": path.display().to_string(),
                "rows": rows.len(),
            }));
        } else {
            println!("Saved {} rows to {}", rows.len(), path.display());
        }
        return Ok(());
    }

    if json_mode {
        print_json(&serde_json::to_value(&rows).unwrap_or_default());
        return Ok(());
    }

    for row in &rows {
        let cells: Vec<String> = row
            .cells()
            .iter()
            .map(|c| match c {
                popsheet_core::Cell::Text(s) => s.clone(),
                popsheet_core::Cell::Number(n) => n.to_string(),
                popsheet_core::Cell::Empty => String::new(),
            })
            .collect();
        println!("{}", cells.join("\t"));
    }
    println!();
    println!("{} countries", rows.len());
    Ok(())
}

// =============================================================================
// SORT COMMAND
// =============================================================================

/// Only request the sort.
pub async fn cmd_sort(
    config_path: Option<&Path>,
    json_mode: bool,
    local: Option<&Path>,
) -> Result<(), PopsheetError> {
    let mut config = load_config(config_path)?;
    config.sort.enabled = true;
    config.validate()?;
    let pipeline = Pipeline::from_config(&config)?;

    match local {
        Some(path) => {
            let mut sink = LocalSheet::open(path)?;
            pipeline.sort(&mut sink).await?;
        }
        None => {
            let mut sink = remote_sheet(&config).await?;
            pipeline.sort(&mut sink).await?;
        }
    }

    if json_mode {
        print_json(&serde_json::json!({
            "sorted": true,
            "sort_column": config.sort.column.key(),
            "sort_order": config.sort.order.to_string(),
        }));
    } else {
        println!("Sorted by {} ({}).", config.sort.column, config.sort.order);
    }
    Ok(())
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Write the default config file.
pub fn cmd_init(config_path: Option<&Path>, force: bool) -> Result<(), PopsheetError> {
    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

    if path.exists() && !force {
        return Err(PopsheetError::IoError(format!(
            "{} already exists. Use --force to overwrite.",
            path.display()
        )));
    }

    let text = Config::default().to_toml_string()?;
    std::fs::write(&path, text)
        .map_err(|e| PopsheetError::IoError(format!("Cannot write {}: {}", path.display(), e)))?;

    println!("Wrote default config to {}", path.display());
    Ok(())
}

// =============================================================================
// CHECK COMMAND
// =============================================================================

/// Validate config and credentials, print the effective settings.
pub fn cmd_check(config_path: Option<&Path>, json_mode: bool) -> Result<(), PopsheetError> {
    let config = load_config(config_path)?;
    let http = reqwest::Client::new();
    let auth = token_source(&config, &http)?;

    if json_mode {
        print_json(&serde_json::json!({
            "valid": true,
            "source_url": config.source.url,
            "spreadsheet": config.sheet.spreadsheet,
            "spreadsheet_id": config.sheet.spreadsheet_id,
            "worksheet": config.sheet.worksheet,
            "auth": auth.describe(),
            "write_mode": format!("{:?}", config.write.mode).to_lowercase(),
            "delay_ms": config.write.delay_ms,
            "sort_enabled": config.sort.enabled,
        }));
        return Ok(());
    }

    println!("popsheet Configuration");
    println!("======================");
    println!("Source:      {}", config.source.url);
    match (&config.sheet.spreadsheet_id, &config.sheet.spreadsheet) {
        (Some(id), _) => println!("Spreadsheet: id {}", id),
        (None, Some(title)) => println!("Spreadsheet: '{}'", title),
        (None, None) => println!("Spreadsheet: -"),
    }
    println!("Worksheet:   #{}", config.sheet.worksheet);
    println!("Auth:        {}", auth.describe());
    println!(
        "Write:       {:?}, {} ms between rows, {} retries",
        config.write.mode, config.write.delay_ms, config.write.max_retries
    );
    if config.sort.enabled {
        println!(
            "Sort:        {} {} (skip {} row(s))",
            config.sort.column, config.sort.order, config.sort.skip_rows
        );
    } else {
        println!("Sort:        disabled");
    }
    println!();
    println!("Configuration OK");
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
