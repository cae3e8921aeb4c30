//! # popsheet
//!
//! Fetches country metadata from the REST Countries API, writes one row per
//! country into a Google spreadsheet, then sorts the sheet by population.
//!
//! ## Usage
//!
//! ```bash
//! # Write the default config, then run
//! popsheet init
//! popsheet run
//!
//! # Dry run into a local JSON worksheet, no pacing
//! popsheet run --local world.json --delay-ms 0
//!
//! # Just look at the rows
//! popsheet fetch --json-mode
//! ```

mod cli;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();

    // Logging goes to stderr; stdout carries command output.
    // POPSHEET_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("POPSHEET_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let default_filter = if cli.verbose {
        "popsheet=debug,popsheet_core=debug"
    } else {
        "popsheet=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the popsheet startup banner to stderr; stdout carries command output.
fn print_banner() {
    eprintln!(
        r#"
  popsheet v{}
  countries -> spreadsheet -> sorted by population
"#,
        env!("CARGO_PKG_VERSION")
    );
}
