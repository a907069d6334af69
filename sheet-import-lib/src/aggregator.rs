//! Groups findings by sheet for display.

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::finding::{Finding, Severity};

pub const UNKNOWN_SHEET: &str = "Unknown Sheet";

/// Findings grouped by sheet name, in the order sheets were first seen.
/// Serializes as a `{ sheetName: [finding, ...] }` object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindingsBySheet {
    groups: Vec<SheetFindings>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SheetFindings {
    pub sheet_name: String,
    pub findings: Vec<Finding>,
}

impl FindingsBySheet {
    pub fn get(&self, sheet_name: &str) -> Option<&[Finding]> {
        self.groups
            .iter()
            .find(|group| group.sheet_name == sheet_name)
            .map(|group| group.findings.as_slice())
    }

    pub fn sheet_names(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|group| group.sheet_name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &SheetFindings> {
        self.groups.iter()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    fn push(&mut self, sheet_name: &str, finding: Finding) {
        match self
            .groups
            .iter_mut()
            .find(|group| group.sheet_name == sheet_name)
        {
            Some(group) => group.findings.push(finding),
            None => self.groups.push(SheetFindings {
                sheet_name: sheet_name.to_string(),
                findings: vec![finding],
            }),
        }
    }
}

impl Serialize for FindingsBySheet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.groups.len()))?;
        for group in &self.groups {
            map.serialize_entry(&group.sheet_name, &group.findings)?;
        }
        map.end()
    }
}

/// Group findings by sheet and prefix each message with its column.
/// The input is left untouched.
pub fn format_findings(findings: &[Finding]) -> FindingsBySheet {
    let mut grouped = FindingsBySheet::default();

    for finding in findings {
        let sheet_name = finding.sheet_name.as_deref().unwrap_or(UNKNOWN_SHEET);
        let mut display = finding.clone();
        if let Some(column) = &finding.column {
            display.message = format!("{}: {}", column, finding.message);
        }
        grouped.push(sheet_name, display);
    }

    grouped
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct FindingSummary {
    pub errors: usize,
    pub warnings: usize,
    pub infos: usize,
}

impl FindingSummary {
    pub fn has_blocking_errors(&self) -> bool {
        self.errors > 0
    }
}

pub fn summarize(findings: &[Finding]) -> FindingSummary {
    findings
        .iter()
        .fold(FindingSummary::default(), |mut summary, finding| {
            match finding.severity {
                Severity::Error => summary.errors += 1,
                Severity::Warning => summary.warnings += 1,
                Severity::Info => summary.infos += 1,
            }
            summary
        })
}
