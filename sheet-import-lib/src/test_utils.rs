// Test utilities available to both unit and integration tests
// Only compiled when testing

use chrono::{DateTime, Utc};
use serde_json::{Value, json};

use crate::record::Sheet;
use crate::row_validator::RowValidator;
use crate::schema::RawRow;

/// Fixed "now" used by tests that look at future dates
pub const TEST_NOW: &str = "2026-10-19T12:00:00Z";

#[allow(dead_code)]
pub fn test_now() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(TEST_NOW)
        .unwrap()
        .with_timezone(&Utc)
}

/// Row validator pinned to [`TEST_NOW`]
#[allow(dead_code)]
pub fn create_row_validator() -> RowValidator {
    RowValidator::new().with_reference_time(test_now())
}

/// Build a row from a JSON object literal
#[allow(dead_code)]
pub fn raw_row(value: Value) -> RawRow {
    value
        .as_object()
        .cloned()
        .expect("test row must be a JSON object")
}

/// Build rows from a JSON array literal
#[allow(dead_code)]
pub fn raw_rows(value: Value) -> Vec<RawRow> {
    value
        .as_array()
        .expect("test rows must be a JSON array")
        .iter()
        .cloned()
        .map(raw_row)
        .collect()
}

/// A row that passes every rule
#[allow(dead_code)]
pub fn valid_row() -> RawRow {
    raw_row(json!({
        "Name": "Alice",
        "Amount": 50,
        "Date": "2024-01-05",
        "Verified": "Yes"
    }))
}

#[allow(dead_code)]
pub fn create_test_sheet(name: &str, rows: Value) -> Sheet {
    Sheet::new(name, raw_rows(rows))
}
