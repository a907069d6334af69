//! Per-row field rules.
//!
//! Every field is checked on its own; a failure in one column never hides a
//! failure in another. Results are ordered errors first, then warnings, each
//! group in row order.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;

use crate::finding::{Finding, order_by_severity};
use crate::normalizer::normalize;
use crate::record::CanonicalRow;
use crate::schema::{
    AMOUNT_COLUMN, DATE_COLUMN, FieldRole, MAX_AMOUNT, MAX_NAME_LENGTH, NAME_COLUMN, RawRow,
    ResolvedRoles, VERIFIED_COLUMN, resolve_roles,
};

/// Validate rows against the current time.
pub fn validate_rows(rows: &[RawRow]) -> Vec<Finding> {
    RowValidator::new().validate_rows(rows)
}

#[derive(Debug, Clone)]
pub struct RowValidator {
    reference_time: DateTime<Utc>,
    sheet_name: Option<String>,
}

impl Default for RowValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl RowValidator {
    pub fn new() -> Self {
        RowValidator {
            reference_time: Utc::now(),
            sheet_name: None,
        }
    }

    /// Dates after this instant are reported as being in the future.
    pub fn with_reference_time(mut self, reference_time: DateTime<Utc>) -> Self {
        self.reference_time = reference_time;
        self
    }

    /// Stamp every finding with the given sheet name.
    pub fn for_sheet(mut self, sheet_name: &str) -> Self {
        self.sheet_name = Some(sheet_name.to_string());
        self
    }

    /// Rows are numbered from 1 in slice order. Column roles are resolved
    /// once, from the header of the first row.
    pub fn validate_rows(&self, rows: &[RawRow]) -> Vec<Finding> {
        let roles = header_roles(rows);
        let findings = rows
            .iter()
            .enumerate()
            .flat_map(|(index, row)| self.check_row(index + 1, row, &roles).1)
            .collect();

        order_by_severity(findings)
    }

    /// Findings of a single row, in field order.
    pub fn validate_row(&self, row_number: usize, row: &RawRow) -> Vec<Finding> {
        self.check_row(row_number, row, &resolve_roles(row.keys())).1
    }

    /// Convert a row to its typed form. Warnings do not prevent conversion.
    pub fn canonicalize(&self, row_number: usize, row: &RawRow) -> Result<CanonicalRow, Vec<Finding>> {
        canonical_or_errors(self.check_row(row_number, row, &resolve_roles(row.keys())))
    }

    /// Convert every row of a sheet, or return the errors of all failing rows.
    pub fn canonicalize_rows(&self, rows: &[RawRow]) -> Result<Vec<CanonicalRow>, Vec<Finding>> {
        let roles = header_roles(rows);
        let mut canonical_rows = Vec::with_capacity(rows.len());
        let mut errors = Vec::new();

        for (index, row) in rows.iter().enumerate() {
            match canonical_or_errors(self.check_row(index + 1, row, &roles)) {
                Ok(canonical) => canonical_rows.push(canonical),
                Err(row_errors) => errors.extend(row_errors),
            }
        }

        if errors.is_empty() {
            Ok(canonical_rows)
        } else {
            Err(errors)
        }
    }

    fn check_row(
        &self,
        row_number: usize,
        row: &RawRow,
        roles: &ResolvedRoles,
    ) -> (Option<CanonicalRow>, Vec<Finding>) {
        let mut field = FieldCheck {
            row_number,
            sheet_name: self.sheet_name.as_deref(),
            roles,
            findings: Vec::new(),
        };

        let name = field.name(row.get(NAME_COLUMN));
        let amount = field.amount(row.get(AMOUNT_COLUMN));
        let date = field.date(row.get(DATE_COLUMN), self.reference_time);
        let verified = field.verified(row.get(VERIFIED_COLUMN));

        let canonical = match (name, amount, date, verified) {
            (Some(name), Some(amount), Some(date), Some(verified)) => Some(CanonicalRow {
                name,
                amount,
                date,
                verified,
                extra: row
                    .iter()
                    .filter(|(column, _)| roles.get(column) == FieldRole::Passthrough)
                    .map(|(column, value)| (column.clone(), value.clone()))
                    .collect(),
            }),
            _ => None,
        };

        (canonical, field.findings)
    }
}

fn header_roles(rows: &[RawRow]) -> ResolvedRoles {
    resolve_roles(rows.first().into_iter().flat_map(|first_row| first_row.keys()))
}

fn canonical_or_errors(
    (canonical, findings): (Option<CanonicalRow>, Vec<Finding>),
) -> Result<CanonicalRow, Vec<Finding>> {
    canonical.ok_or_else(|| findings.into_iter().filter(Finding::is_error).collect())
}

struct FieldCheck<'a> {
    row_number: usize,
    sheet_name: Option<&'a str>,
    roles: &'a ResolvedRoles,
    findings: Vec<Finding>,
}

impl FieldCheck<'_> {
    fn error(&mut self, column: &str, message: impl Into<String>) {
        let finding = Finding::error(self.row_number, Some(column), message);
        self.push(finding);
    }

    fn warning(&mut self, column: &str, message: impl Into<String>) {
        let finding = Finding::warning(self.row_number, Some(column), message);
        self.push(finding);
    }

    fn push(&mut self, finding: Finding) {
        let finding = match self.sheet_name {
            Some(sheet_name) => finding.in_sheet(sheet_name),
            None => finding,
        };
        self.findings.push(finding);
    }

    fn name(&mut self, value: Option<&Value>) -> Option<String> {
        let text = match value {
            None | Some(Value::Null) => {
                self.error(NAME_COLUMN, "Name is required");
                return None;
            }
            Some(Value::String(s)) if s.is_empty() => {
                self.error(NAME_COLUMN, "Name is required");
                return None;
            }
            Some(Value::String(s)) => s.trim(),
            Some(_) => {
                self.error(NAME_COLUMN, "Name must be text");
                return None;
            }
        };

        if text.is_empty() {
            self.error(NAME_COLUMN, "cannot be empty");
            return None;
        }
        if text.chars().count() > MAX_NAME_LENGTH {
            self.warning(
                NAME_COLUMN,
                format!("is unusually long (more than {MAX_NAME_LENGTH} characters)"),
            );
        }
        Some(text.to_string())
    }

    fn amount(&mut self, value: Option<&Value>) -> Option<f64> {
        let Some(value) = present(value) else {
            self.error(AMOUNT_COLUMN, "Amount is required");
            return None;
        };

        let Some(amount) = coerce_number(value) else {
            self.error(AMOUNT_COLUMN, "must be a number");
            return None;
        };

        if amount <= 0.0 {
            self.error(AMOUNT_COLUMN, "must be positive");
            return None;
        }
        if amount > MAX_AMOUNT {
            self.warning(AMOUNT_COLUMN, "is unusually large (more than 1,000,000)");
        }
        Some(amount)
    }

    fn date(&mut self, value: Option<&Value>, reference_time: DateTime<Utc>) -> Option<NaiveDate> {
        let Some(value) = present(value) else {
            self.error(DATE_COLUMN, "Date is required");
            return None;
        };

        let date = normalize(value, self.roles.get(DATE_COLUMN))
            .as_str()
            .and_then(|iso| NaiveDate::parse_from_str(iso, "%Y-%m-%d").ok());
        let Some(date) = date else {
            self.error(DATE_COLUMN, "Invalid date format");
            return None;
        };

        if date.and_time(chrono::NaiveTime::MIN).and_utc() > reference_time {
            self.warning(DATE_COLUMN, "Date is in the future");
        }
        Some(date)
    }

    fn verified(&mut self, value: Option<&Value>) -> Option<bool> {
        let Some(value) = present(value) else {
            self.error(VERIFIED_COLUMN, "Verified is required");
            return None;
        };

        match (value, normalize(value, self.roles.get(VERIFIED_COLUMN))) {
            (_, Value::Bool(flag)) => Some(flag),
            (Value::String(_), _) => {
                self.error(VERIFIED_COLUMN, "must be Yes/No or True/False");
                None
            }
            _ => {
                self.error(VERIFIED_COLUMN, "must be a boolean value");
                None
            }
        }
    }
}

/// Absent keys, nulls and blank strings all count as missing.
fn present(value: Option<&Value>) -> Option<&Value> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.trim().is_empty() => None,
        Some(value) => Some(value),
    }
}

/// Numbers and numeric strings; anything non-finite is rejected.
fn coerce_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finding::Severity;
    use serde_json::json;

    fn row(value: Value) -> RawRow {
        value.as_object().cloned().unwrap()
    }

    fn fixed_validator() -> RowValidator {
        let now = DateTime::parse_from_rfc3339("2026-10-19T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        RowValidator::new().with_reference_time(now)
    }

    fn messages(findings: &[Finding]) -> Vec<(&str, &str)> {
        findings
            .iter()
            .map(|f| (f.column.as_deref().unwrap_or(""), f.message.as_str()))
            .collect()
    }

    #[test]
    fn test_valid_row_has_no_findings() {
        let rows = [row(json!({ "Name": "A", "Amount": 50, "Date": "2024-01-01", "Verified": "Yes" }))];
        assert!(fixed_validator().validate_rows(&rows).is_empty());
    }

    #[test]
    fn test_name_rules() {
        let validator = fixed_validator();
        let cases = [
            (json!({}), "Name is required"),
            (json!({ "Name": null }), "Name is required"),
            (json!({ "Name": "" }), "Name is required"),
            (json!({ "Name": 42 }), "Name must be text"),
            (json!({ "Name": "   " }), "cannot be empty"),
        ];

        for (value, expected) in cases {
            let findings = validator.validate_row(1, &row(value));
            let name: Vec<_> = findings
                .iter()
                .filter(|f| f.column.as_deref() == Some("Name"))
                .collect();
            assert_eq!(name.len(), 1);
            assert_eq!(name[0].message, expected);
        }
    }

    #[test]
    fn test_long_name_warns() {
        let long_name = "x".repeat(MAX_NAME_LENGTH + 1);
        let findings = fixed_validator().validate_row(
            1,
            &row(json!({ "Name": long_name, "Amount": 1, "Date": "2024-01-01", "Verified": true })),
        );
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Warning);
    }

    #[test]
    fn test_amount_accepts_numeric_strings() {
        let findings = fixed_validator().validate_row(
            1,
            &row(json!({ "Name": "A", "Amount": " 12.50 ", "Date": "2024-01-01", "Verified": "no" })),
        );
        assert!(findings.is_empty());
    }

    #[test]
    fn test_amount_rules() {
        let validator = fixed_validator();
        let cases = [
            (json!(null), "Amount is required"),
            (json!("  "), "Amount is required"),
            (json!("abc"), "must be a number"),
            (json!(true), "must be a number"),
            (json!("NaN"), "must be a number"),
            (json!(0), "must be positive"),
            (json!(-5), "must be positive"),
        ];

        for (amount, expected) in cases {
            let findings = validator.validate_row(1, &row(json!({ "Amount": amount })));
            let found: Vec<_> = findings
                .iter()
                .filter(|f| f.column.as_deref() == Some("Amount"))
                .map(|f| f.message.as_str())
                .collect();
            assert_eq!(found, vec![expected], "amount {amount}");
        }
    }

    #[test]
    fn test_verified_rules() {
        let validator = fixed_validator();
        let cases = [
            (json!(null), "Verified is required"),
            (json!("maybe"), "must be Yes/No or True/False"),
            (json!(1), "must be a boolean value"),
        ];

        for (verified, expected) in cases {
            let findings = validator.validate_row(1, &row(json!({ "Verified": verified })));
            let found: Vec<_> = findings
                .iter()
                .filter(|f| f.column.as_deref() == Some("Verified"))
                .map(|f| f.message.as_str())
                .collect();
            assert_eq!(found, vec![expected]);
        }
    }

    #[test]
    fn test_date_serial_accepted() {
        let findings = fixed_validator().validate_row(
            1,
            &row(json!({ "Name": "A", "Amount": 1, "Date": 45292, "Verified": "TRUE" })),
        );
        assert!(findings.is_empty());
    }

    #[test]
    fn test_today_is_not_in_the_future() {
        let findings = fixed_validator().validate_row(
            1,
            &row(json!({ "Name": "A", "Amount": 1, "Date": "2026-10-19", "Verified": "yes" })),
        );
        assert!(findings.is_empty());

        let findings = fixed_validator().validate_row(
            1,
            &row(json!({ "Name": "A", "Amount": 1, "Date": "2026-10-20", "Verified": "yes" })),
        );
        assert_eq!(messages(&findings), vec![("Date", "Date is in the future")]);
    }

    #[test]
    fn test_sheet_name_is_stamped() {
        let findings = fixed_validator()
            .for_sheet("Expenses")
            .validate_rows(&[row(json!({}))]);
        assert_eq!(findings.len(), 4);
        assert!(findings.iter().all(|f| f.sheet_name.as_deref() == Some("Expenses")));
    }

    #[test]
    fn test_canonicalize_carries_extras() {
        let canonical = fixed_validator()
            .canonicalize(
                1,
                &row(json!({ "Name": " A ", "Amount": "7", "Date": 45292, "Verified": "No", "Notes": "n" })),
            )
            .unwrap();

        assert_eq!(canonical.name, "A");
        assert_eq!(canonical.amount, 7.0);
        assert_eq!(canonical.date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert!(!canonical.verified);
        assert_eq!(canonical.extra["Notes"], json!("n"));
    }

    #[test]
    fn test_canonicalize_returns_only_errors() {
        let errors = fixed_validator()
            .canonicalize(
                3,
                &row(json!({ "Name": "A", "Amount": 2_000_000, "Date": "bad", "Verified": "Yes" })),
            )
            .unwrap_err();

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "Invalid date format");
        assert_eq!(errors[0].row, 3);
    }

    #[test]
    fn test_canonicalize_rows_uses_header_roles() {
        let rows = vec![
            row(json!({ "Name": "A", "Amount": 1, "Date": 45292, "Verified": "yes", "date": 45292 })),
            row(json!({ "Name": "B", "Amount": 2, "Date": "2024-01-02", "Verified": false, "date": "x" })),
        ];

        let canonical = fixed_validator().canonicalize_rows(&rows).unwrap();

        assert_eq!(canonical.len(), 2);
        assert_eq!(canonical[0].date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        // A lowercase "date" header is not the Date column and stays untouched
        assert_eq!(canonical[0].extra["date"], json!(45292));
        assert_eq!(canonical[1].extra["date"], json!("x"));
    }

    #[test]
    fn test_canonicalize_rows_collects_every_failing_row() {
        let rows = vec![
            row(json!({ "Name": "A", "Amount": 0, "Date": "2024-01-01", "Verified": "Yes" })),
            row(json!({ "Name": "B", "Amount": 1, "Date": "2024-01-01", "Verified": "Yes" })),
            row(json!({ "Name": "", "Amount": 1, "Date": "2024-01-01", "Verified": "Yes" })),
        ];

        let errors = fixed_validator().canonicalize_rows(&rows).unwrap_err();

        let rows_with_errors: Vec<usize> = errors.iter().map(|f| f.row).collect();
        assert_eq!(rows_with_errors, vec![1, 3]);
    }
}
