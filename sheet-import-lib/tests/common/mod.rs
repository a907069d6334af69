use serde_json::Value;
use sheet_import_lib::{Finding, Severity};

// Re-export shared test utilities from src/test_utils.rs
pub use sheet_import_lib::test_utils::{
    create_row_validator, create_test_sheet, raw_row, raw_rows, test_now, valid_row,
};

/// (column, message) pairs of the given findings, in order
#[allow(dead_code)]
pub fn column_messages(findings: &[Finding]) -> Vec<(String, String)> {
    findings
        .iter()
        .map(|f| (f.column.clone().unwrap_or_default(), f.message.clone()))
        .collect()
}

#[allow(dead_code)]
pub fn severities(findings: &[Finding]) -> Vec<Severity> {
    findings.iter().map(|f| f.severity).collect()
}

/// `count` copies of the given row
#[allow(dead_code)]
pub fn repeated_rows(row: Value, count: usize) -> Value {
    Value::Array(vec![row; count])
}
