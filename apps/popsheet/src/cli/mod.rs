//! # popsheet CLI Module
//!
//! ## Available Commands
//!
//! - `run` - Fetch countries, write them to the spreadsheet, sort (default)
//! - `fetch` - Fetch and map rows without writing anywhere
//! - `sort` - Only request the sort
//! - `init` - Write a default config file
//! - `check` - Validate config and credentials

mod commands;

use clap::{Parser, Subcommand};
use popsheet_core::PopsheetError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// popsheet - country metadata into a spreadsheet, sorted by population
#[derive(Parser, Debug)]
#[command(name = "popsheet")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the config file (default: popsheet.toml, optional)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch countries, write them to the spreadsheet and sort by population
    Run {
        /// Write to a local JSON worksheet instead of Google Sheets
        #[arg(short, long)]
        local: Option<PathBuf>,

        /// Append all rows in one request
        #[arg(short, long)]
        batch: bool,

        /// Delay between single-row appends, in milliseconds
        #[arg(short, long)]
        delay_ms: Option<u64>,

        /// Skip the final sort
        #[arg(long)]
        no_sort: bool,
    },

    /// Fetch countries and print the mapped rows
    Fetch {
        /// Save rows to this file instead of printing them
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Only sort the spreadsheet
    Sort {
        /// Sort a local JSON worksheet instead of Google Sheets
        #[arg(short, long)]
        local: Option<PathBuf>,
    },

    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Validate the configuration and credentials
    Check,
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), PopsheetError> {
    let json_mode = cli.json_mode;
    let config_path = cli.config.as_deref();

    match cli.command {
        Some(Commands::Init { force }) => cmd_init(config_path, force),
        Some(Commands::Check) => cmd_check(config_path, json_mode),
        Some(Commands::Fetch { output }) => {
            cmd_fetch(config_path, json_mode, output.as_deref()).await
        }
        Some(Commands::Sort { local }) => {
            cmd_sort(config_path, json_mode, local.as_deref()).await
        }
        Some(Commands::Run {
            local,
            batch,
            delay_ms,
            no_sort,
        }) => {
            let overrides = RunOverrides {
                batch,
                delay_ms,
                no_sort,
            };
            cmd_run(config_path, json_mode, local.as_deref(), overrides).await
        }
        None => cmd_run(config_path, json_mode, None, RunOverrides::default()).await,
    }
}
