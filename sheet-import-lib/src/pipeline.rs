//! The full validation pass over a workbook, and the authoritative import.
//!
//! Preview and import run the same steps with the same rule table:
//! structural checks first (a structural error stops that sheet), then the
//! per-row rules.

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use thiserror::Error;

use crate::finding::{Finding, has_errors, order_by_severity};
use crate::pending::{ImportToken, PendingError, PendingImports};
use crate::record::{PersistedRecord, Sheet};
use crate::row_validator::RowValidator;
use crate::store::{InsertSummary, RecordStore, StoreError};
use crate::structure::check_rows;

#[derive(Debug, Clone, PartialEq)]
pub struct SheetPreview {
    pub name: String,
    pub total_rows: usize,
    /// Rows without any error finding
    pub valid_rows: usize,
    pub findings: Vec<Finding>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkbookPreview {
    pub sheets: Vec<SheetPreview>,
}

impl WorkbookPreview {
    /// All findings of the workbook, errors first, sheets in workbook order.
    pub fn findings(&self) -> Vec<Finding> {
        let all = self
            .sheets
            .iter()
            .flat_map(|sheet| sheet.findings.iter().cloned())
            .collect();
        order_by_severity(all)
    }

    pub fn can_import(&self) -> bool {
        self.sheets.iter().all(|sheet| !has_errors(&sheet.findings))
    }
}

/// Validate one sheet. Findings carry the sheet name.
pub fn preview_sheet(sheet: &Sheet, validator: &RowValidator) -> SheetPreview {
    let structural: Vec<Finding> = check_rows(&sheet.rows)
        .into_iter()
        .map(|finding| finding.in_sheet(&sheet.name))
        .collect();

    if has_errors(&structural) {
        return SheetPreview {
            name: sheet.name.clone(),
            total_rows: sheet.rows.len(),
            valid_rows: 0,
            findings: structural,
        };
    }

    let row_findings = validator
        .clone()
        .for_sheet(&sheet.name)
        .validate_rows(&sheet.rows);

    let rows_with_errors: HashSet<usize> = row_findings
        .iter()
        .filter(|f| f.is_error())
        .map(|f| f.row)
        .collect();

    let mut findings = structural;
    findings.extend(row_findings);

    SheetPreview {
        name: sheet.name.clone(),
        total_rows: sheet.rows.len(),
        valid_rows: sheet.rows.len() - rows_with_errors.len(),
        findings: order_by_severity(findings),
    }
}

pub fn preview_workbook(sheets: &[Sheet], validator: &RowValidator) -> WorkbookPreview {
    let sheets: Vec<SheetPreview> = sheets
        .iter()
        .map(|sheet| preview_sheet(sheet, validator))
        .collect();

    tracing::debug!(sheets = sheets.len(), "workbook preview complete");
    WorkbookPreview { sheets }
}

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Import rejected with {} validation error(s)", error_count(.0))]
    Rejected(Vec<Finding>),

    #[error("Nothing to import")]
    NothingToImport,

    #[error("{failed} record(s) could not be saved ({inserted} saved)")]
    PartialInsert { inserted: usize, failed: usize },

    #[error(transparent)]
    Pending(#[from] PendingError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

fn error_count(findings: &[Finding]) -> usize {
    findings.iter().filter(|f| f.is_error()).count()
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportSummary {
    pub inserted: usize,
    /// Warnings seen while re-validating; they never block an import
    pub warnings: Vec<Finding>,
}

/// Server side of an import: re-validates everything before writing.
pub struct Importer<S: RecordStore> {
    store: S,
    validator: RowValidator,
}

impl<S: RecordStore> Importer<S> {
    pub fn new(store: S) -> Self {
        Importer {
            store,
            validator: RowValidator::new(),
        }
    }

    pub fn with_validator(mut self, validator: RowValidator) -> Self {
        self.validator = validator;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Import the sheets parked under `token`. The token is consumed even when
    /// the import fails; the sheets are validated again before writing.
    pub fn import_pending(
        &mut self,
        pending: &mut PendingImports,
        token: ImportToken,
    ) -> Result<ImportSummary, ImportError> {
        let sheets = pending.take(token)?;
        self.import(&sheets)
    }

    /// Validate all sheets and, when no error is found, persist every row.
    pub fn import(&mut self, sheets: &[Sheet]) -> Result<ImportSummary, ImportError> {
        self.import_at(sheets, Utc::now())
    }

    pub fn import_at(
        &mut self,
        sheets: &[Sheet],
        imported_at: DateTime<Utc>,
    ) -> Result<ImportSummary, ImportError> {
        if sheets.is_empty() {
            return Err(ImportError::NothingToImport);
        }

        let preview = preview_workbook(sheets, &self.validator);
        let findings = preview.findings();
        if has_errors(&findings) {
            tracing::info!(
                errors = findings.iter().filter(|f| f.is_error()).count(),
                "import rejected"
            );
            return Err(ImportError::Rejected(findings));
        }

        let mut records = Vec::new();
        for sheet in sheets {
            let canonical_rows = self
                .validator
                .clone()
                .for_sheet(&sheet.name)
                .canonicalize_rows(&sheet.rows)
                .map_err(ImportError::Rejected)?;
            records.extend(canonical_rows.into_iter().map(|canonical| {
                PersistedRecord::from_canonical(canonical, &sheet.name, imported_at)
            }));
        }

        let InsertSummary { inserted, failed } = self.store.insert_many(&records)?;
        if failed > 0 {
            return Err(ImportError::PartialInsert { inserted, failed });
        }

        Ok(ImportSummary {
            inserted,
            warnings: findings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::{Value, json};

    fn sheet(name: &str, rows: Value) -> Sheet {
        let rows = rows
            .as_array()
            .unwrap()
            .iter()
            .map(|row| row.as_object().cloned().unwrap())
            .collect();
        Sheet::new(name, rows)
    }

    fn validator() -> RowValidator {
        let now = DateTime::parse_from_rfc3339("2026-10-19T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        RowValidator::new().with_reference_time(now)
    }

    #[test]
    fn test_structural_error_skips_row_rules() {
        let sheets = [sheet("Bad", json!([{ "Name": "", "Amount": 1, "Date": "2024-01-01" }]))];

        let preview = preview_workbook(&sheets, &validator());

        let findings = &preview.sheets[0].findings;
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].row, 0);
        assert!(findings[0].message.contains("Verified"));
        assert!(!preview.can_import());
    }

    #[test]
    fn test_extra_columns_warning_then_row_rules() {
        let sheets = [sheet(
            "Sheet1",
            json!([
                { "Name": "A", "Amount": 0, "Date": "2024-01-01", "Verified": "Yes", "Notes": "x" },
                { "Name": "B", "Amount": 5, "Date": "2024-01-01", "Verified": "No", "Notes": "y" }
            ]),
        )];

        let preview = preview_workbook(&sheets, &validator());
        let sheet = &preview.sheets[0];

        assert_eq!(sheet.valid_rows, 1);
        assert_eq!(sheet.findings.len(), 2);
        assert!(sheet.findings[0].is_error());
        assert_eq!(sheet.findings[1].message, "Extra columns will be ignored: Notes");
    }

    #[test]
    fn test_import_persists_canonical_rows() {
        let sheets = [
            sheet(
                "Jan",
                json!([{ "Name": " Alice ", "Amount": "10.5", "Date": 45292, "Verified": "yes" }]),
            ),
            sheet(
                "Feb",
                json!([{ "Name": "Bob", "Amount": 2_000_000, "Date": "2024-02-01", "Verified": false }]),
            ),
        ];
        let mut importer = Importer::new(MemoryStore::new()).with_validator(validator());

        let summary = importer.import(&sheets).unwrap();

        assert_eq!(summary.inserted, 2);
        assert_eq!(summary.warnings.len(), 1);
        let records = importer.store().records();
        assert_eq!(records[0].name, "Alice");
        assert_eq!(records[0].sheet_name, "Jan");
        assert_eq!(records[0].date.to_string(), "2024-01-01");
        assert_eq!(records[1].sheet_name, "Feb");
    }

    #[test]
    fn test_import_rejects_any_error() {
        let sheets = [sheet(
            "Sheet1",
            json!([
                { "Name": "A", "Amount": 1, "Date": "2024-01-01", "Verified": "Yes" },
                { "Name": "B", "Amount": "x", "Date": "2024-01-01", "Verified": "Yes" }
            ]),
        )];
        let mut importer = Importer::new(MemoryStore::new()).with_validator(validator());

        let error = importer.import(&sheets).unwrap_err();

        match error {
            ImportError::Rejected(findings) => {
                assert_eq!(findings.len(), 1);
                assert_eq!(findings[0].row, 2);
                assert_eq!(findings[0].sheet_name.as_deref(), Some("Sheet1"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(importer.store().records().is_empty());
    }

    #[test]
    fn test_partial_insert_is_aggregate() {
        let sheets = [sheet(
            "Sheet1",
            json!([
                { "Name": "A", "Amount": 1, "Date": "2024-01-01", "Verified": "Yes" },
                { "Name": "B", "Amount": 2, "Date": "2024-01-01", "Verified": "Yes" },
                { "Name": "C", "Amount": 3, "Date": "2024-01-01", "Verified": "Yes" }
            ]),
        )];
        let mut importer =
            Importer::new(MemoryStore::with_capacity_limit(1)).with_validator(validator());

        let error = importer.import(&sheets).unwrap_err();

        assert!(matches!(
            error,
            ImportError::PartialInsert {
                inserted: 1,
                failed: 2
            }
        ));
        assert_eq!(error.to_string(), "2 record(s) could not be saved (1 saved)");
    }

    #[test]
    fn test_nothing_to_import() {
        let mut importer = Importer::new(MemoryStore::new());
        assert!(matches!(
            importer.import(&[]),
            Err(ImportError::NothingToImport)
        ));
    }
}
