use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        };
        f.write_str(label)
    }
}

/// One validation result.
///
/// `row == 0` marks a file or sheet level finding; data rows start at 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub row: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheet_name: Option<String>,
    pub severity: Severity,
}

impl Finding {
    pub fn error(row: usize, column: Option<&str>, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, row, column, message)
    }

    pub fn warning(row: usize, column: Option<&str>, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, row, column, message)
    }

    pub fn info(row: usize, column: Option<&str>, message: impl Into<String>) -> Self {
        Self::new(Severity::Info, row, column, message)
    }

    fn new(severity: Severity, row: usize, column: Option<&str>, message: impl Into<String>) -> Self {
        Finding {
            row,
            column: column.map(str::to_string),
            message: message.into(),
            sheet_name: None,
            severity,
        }
    }

    pub fn in_sheet(mut self, sheet_name: &str) -> Self {
        self.sheet_name = Some(sheet_name.to_string());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.row == 0 {
            write!(f, "[{}] ", self.severity)?;
        } else {
            write!(f, "[{}] row {}: ", self.severity, self.row)?;
        }
        match &self.column {
            Some(column) => write!(f, "{}: {}", column, self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Stable partition: errors first, then warnings, then info. Relative order
/// inside each severity is preserved.
pub fn order_by_severity(findings: Vec<Finding>) -> Vec<Finding> {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let mut infos = Vec::new();

    for finding in findings {
        match finding.severity {
            Severity::Error => errors.push(finding),
            Severity::Warning => warnings.push(finding),
            Severity::Info => infos.push(finding),
        }
    }

    errors.extend(warnings);
    errors.extend(infos);
    errors
}

pub fn has_errors(findings: &[Finding]) -> bool {
    findings.iter().any(Finding::is_error)
}
