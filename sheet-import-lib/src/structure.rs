//! Sheet shape checks.
//!
//! Checks run in a fixed order and the first failing one returns at once.
//! The extra-column warning is the only non-fatal outcome.

use serde_json::{Value, json};
use std::sync::LazyLock;

use crate::finding::Finding;
use crate::schema::{MAX_ROWS, RawRow, extra_columns, required_columns};

pub const INVALID_FORMAT_MESSAGE: &str = "Invalid file format: expected a list of rows";
pub const EMPTY_SHEET_MESSAGE: &str = "Sheet is empty";

/// Check an untyped payload (e.g. a submitted JSON body).
pub fn check_structure(input: &Value) -> Vec<Finding> {
    if !is_row_collection(input) {
        return vec![Finding::error(0, None, INVALID_FORMAT_MESSAGE)];
    }

    let rows: Vec<RawRow> = match input.as_array() {
        Some(items) => items
            .iter()
            .filter_map(|item| item.as_object().cloned())
            .collect(),
        None => return vec![Finding::error(0, None, INVALID_FORMAT_MESSAGE)],
    };

    check_rows(&rows)
}

/// Check decoded rows.
pub fn check_rows(rows: &[RawRow]) -> Vec<Finding> {
    let Some(first_row) = rows.first() else {
        return vec![Finding::error(0, None, EMPTY_SHEET_MESSAGE)];
    };

    if rows.len() > MAX_ROWS {
        return vec![Finding::error(
            0,
            None,
            format!(
                "File has too many rows ({}). Maximum allowed is {}. Please split the data into smaller files.",
                rows.len(),
                MAX_ROWS
            ),
        )];
    }

    let missing = check_columns_only(first_row);
    if !missing.is_empty() {
        return missing;
    }

    let extra = extra_columns(first_row);
    if !extra.is_empty() {
        return vec![Finding::warning(
            0,
            None,
            format!("Extra columns will be ignored: {}", extra.join(", ")),
        )];
    }

    Vec::new()
}

/// Header check only: every required column must be a key of the first row.
pub fn check_columns_only(first_row: &RawRow) -> Vec<Finding> {
    let missing: Vec<&str> = required_columns()
        .filter(|column| !first_row.contains_key(*column))
        .collect();

    if missing.is_empty() {
        return Vec::new();
    }

    vec![Finding::error(
        0,
        None,
        format!("Missing required columns: {}", missing.join(", ")),
    )]
}

static ROW_COLLECTION: LazyLock<jsonschema::Validator> = LazyLock::new(|| {
    let schema = json!({
        "type": "array",
        "items": { "type": "object" }
    });
    jsonschema::validator_for(&schema).expect("row collection schema is a valid JSON Schema")
});

fn is_row_collection(input: &Value) -> bool {
    ROW_COLLECTION.is_valid(input)
}
