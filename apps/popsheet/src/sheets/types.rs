//! # Sheets & Drive Wire Types
//!
//! Request and response bodies for the handful of Google endpoints popsheet
//! calls. Only the fields popsheet reads are modelled.

use popsheet_core::{Row, SortSpec};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

// =============================================================================
// DRIVE
// =============================================================================

/// `GET /drive/v3/files` response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DriveFileList {
    #[serde(default)]
    pub files: Vec<DriveFile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriveFile {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Drive MIME type of a Google spreadsheet.
pub const SPREADSHEET_MIME: &str = "application/vnd.google-apps.spreadsheet";

/// Drive search expression for a spreadsheet with an exact title.
#[must_use]
pub fn spreadsheet_query(title: &str) -> String {
    let escaped = title.replace('\\', "\\\\").replace('\'', "\\'");
    format!(
        "name = '{}' and mimeType = '{}' and trashed = false",
        escaped, SPREADSHEET_MIME
    )
}

// =============================================================================
// SPREADSHEET METADATA
// =============================================================================

/// `GET /v4/spreadsheets/{id}?fields=sheets.properties` response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpreadsheetMeta {
    #[serde(default)]
    pub sheets: Vec<SheetEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetEntry {
    pub properties: SheetProperties,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetProperties {
    pub sheet_id: i64,
    pub title: String,
    #[serde(default)]
    pub index: usize,
}

// =============================================================================
// VALUES
// =============================================================================

/// Body of a values update or append.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueRange {
    pub range: String,
    pub major_dimension: String,
    pub values: Vec<Row>,
}

impl ValueRange {
    #[must_use]
    pub fn rows(range: String, values: Vec<Row>) -> Self {
        Self {
            range,
            major_dimension: "ROWS".to_string(),
            values,
        }
    }
}

/// A1 reference into a worksheet, quoting the title.
///
/// `a1_range("Sheet 1", "A1")` gives `'Sheet 1'!A1`.
#[must_use]
pub fn a1_range(title: &str, cell: &str) -> String {
    format!("'{}'!{}", title.replace('\'', "''"), cell)
}

// =============================================================================
// BATCH UPDATE
// =============================================================================

/// Body of `POST /v4/spreadsheets/{id}:batchUpdate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchUpdate {
    pub requests: Vec<Value>,
}

/// Insert `count` blank rows before 0-based row `start`.
#[must_use]
pub fn insert_rows_request(sheet_id: i64, start: usize, count: usize) -> Value {
    json!({
        "insertDimension": {
            "range": {
                "sheetId": sheet_id,
                "dimension": "ROWS",
                "startIndex": start,
                "endIndex": start + count,
            },
            "inheritFromBefore": false,
        }
    })
}

/// Sort rows `spec.skip_rows..` over columns `0..width`.
#[must_use]
pub fn sort_range_request(sheet_id: i64, spec: &SortSpec, width: usize) -> Value {
    json!({
        "sortRange": {
            "range": {
                "sheetId": sheet_id,
                "startRowIndex": spec.skip_rows,
                "startColumnIndex": 0,
                "endColumnIndex": width,
            },
            "sortSpecs": [{
                "dimensionIndex": spec.column.index(),
                "sortOrder": spec.order.api_name(),
            }],
        }
    })
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use popsheet_core::{COLUMN_COUNT, Cell};

    #[test]
    fn query_escapes_quotes() {
        let q = spreadsheet_query("Bob's feeds");
        assert!(q.starts_with("name = 'Bob\\'s feeds'"));
        assert!(q.contains(SPREADSHEET_MIME));
        assert!(q.ends_with("trashed = false"));
    }

    #[test]
    fn a1_range_quotes_title() {
        assert_eq!(a1_range("Sheet1", "A1"), "'Sheet1'!A1");
        assert_eq!(a1_range("it's", "A3"), "'it''s'!A3");
    }

    #[test]
    fn sort_request_targets_population_descending() {
        let req = sort_range_request(42, &SortSpec::default(), COLUMN_COUNT);
        let sort = &req["sortRange"];
        assert_eq!(sort["range"]["sheetId"], 42);
        assert_eq!(sort["range"]["startRowIndex"], 1);
        assert_eq!(sort["range"]["endColumnIndex"], 7);
        assert_eq!(sort["sortSpecs"][0]["dimensionIndex"], 5);
        assert_eq!(sort["sortSpecs"][0]["sortOrder"], "DESCENDING");
    }

    #[test]
    fn insert_request_covers_one_row() {
        let req = insert_rows_request(0, 0, 1);
        let range = &req["insertDimension"]["range"];
        assert_eq!(range["startIndex"], 0);
        assert_eq!(range["endIndex"], 1);
        assert_eq!(range["dimension"], "ROWS");
    }

    #[test]
    fn value_range_serializes_rows() {
        let body = ValueRange::rows(
            a1_range("Sheet1", "A1"),
            vec![Row::new(vec![Cell::from("Chad"), Cell::Number(1)])],
        );
        let json = serde_json::to_value(&body).expect("serialize");
        assert_eq!(json["majorDimension"], "ROWS");
        assert_eq!(json["values"][0][0], "Chad");
        assert_eq!(json["values"][0][1], 1);
    }

    #[test]
    fn metadata_parses() {
        let meta: SpreadsheetMeta = serde_json::from_str(
            r#"{"sheets":[{"properties":{"sheetId":0,"title":"Sheet1","index":0}}]}"#,
        )
        .expect("parse");
        assert_eq!(meta.sheets[0].properties.title, "Sheet1");
    }
}
