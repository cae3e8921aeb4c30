//! Tests that run the `popsheet` binary and look at what it prints.
//!
//! Stdout must carry only command output; the banner and logs belong on
//! stderr.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use axum::{Json, Router, routing::get};
use serde_json::{Value, json};
use std::path::Path;
use std::process::{Command, Output};

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

fn popsheet(dir: &Path, args: &[&str], source_url: Option<&str>) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_popsheet"));
    cmd.current_dir(dir)
        .args(args)
        .env_remove("POPSHEET_LOG_FORMAT")
        .env_remove("POPSHEET_DELAY_MS");
    match source_url {
        Some(url) => cmd.env("POPSHEET_SOURCE_URL", url),
        None => cmd.env_remove("POPSHEET_SOURCE_URL"),
    };
    cmd.output().unwrap()
}

async fn spawn_countries() -> String {
    let countries = json!([
        {"name": "Chile", "alpha2Code": "CL", "alpha3Code": "CHL",
         "region": "Americas", "subregion": "South America",
         "population": 18191900, "latlng": [-30.0, -71.0]},
        {"name": "Malta", "alpha2Code": "MT", "alpha3Code": "MLT",
         "region": "Europe", "subregion": "Southern Europe",
         "population": 425384, "latlng": [35.83333333, 14.58333333]}
    ]);
    let router = Router::new().route(
        "/v2/all",
        get(move || {
            let body = countries.clone();
            async move { Json(body) }
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}/v2/all")
}

// =============================================================================
// OUTPUT STREAM TESTS
// =============================================================================

#[test]
fn test_banner_goes_to_stderr() {
    let dir = tempfile::tempdir().unwrap();
    let output = popsheet(dir.path(), &["init", "--config", "out.toml"], None);

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stdout.starts_with("Wrote default config to"), "{stdout}");
    assert!(!stdout.contains("popsheet v"));
    assert!(stderr.contains(&format!("popsheet v{}", env!("CARGO_PKG_VERSION"))));
    assert!(dir.path().join("out.toml").exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_fetch_output_in_json_mode_prints_json() {
    let url = spawn_countries().await;
    let dir = tempfile::tempdir().unwrap();
    let workdir = dir.path().to_path_buf();

    let output = tokio::task::spawn_blocking(move || {
        popsheet(
            &workdir,
            &["--json-mode", "fetch", "--output", "rows.json"],
            Some(&url),
        )
    })
    .await
    .unwrap();

    assert!(
        output.status.success(),
        "{}",
        String::from_utf8_lossy(&output.stderr)
    );
    let summary: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["rows"], 2);
    assert!(summary["output"].as_str().unwrap().ends_with("rows.json"));

    let saved: Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("rows.json")).unwrap())
            .unwrap();
    assert_eq!(saved[0][0], "Chile");
    assert_eq!(saved[1][5], 425384);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_fetch_output_plain_mode_prints_summary_line() {
    let url = spawn_countries().await;
    let dir = tempfile::tempdir().unwrap();
    let workdir = dir.path().to_path_buf();

    let output = tokio::task::spawn_blocking(move || {
        popsheet(&workdir, &["-q", "fetch", "--output", "rows.json"], Some(&url))
    })
    .await
    .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.starts_with("Saved 2 rows to rows.json"), "{stdout}");
}
