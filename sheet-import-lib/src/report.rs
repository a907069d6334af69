use std::path::Path;

use crate::aggregator::{format_findings, summarize};
use crate::finding::Finding;
use crate::utils::{get_utc_iso_datetime, write_error_to_log};

/// Render findings as the plain text report written to the errors log.
pub fn format_validation_report(findings: &[Finding]) -> String {
    let mut report = String::new();

    report.push_str("=============================\n");
    report.push_str(&format!("Generated at: {}\n\n", get_utc_iso_datetime()));

    let summary = summarize(findings);
    report.push_str(&format!(
        "Total errors: {}, warnings: {}\n\n",
        summary.errors, summary.warnings
    ));

    for group in format_findings(findings).iter() {
        report.push_str(&format!("Sheet \"{}\":\n", group.sheet_name));
        for finding in &group.findings {
            let location = if finding.row == 0 {
                "sheet".to_string()
            } else {
                format!("row {}", finding.row)
            };
            report.push_str(&format!(
                "  - [{}] {}: {}\n",
                finding.severity, location, finding.message
            ));
        }
        report.push('\n');
    }

    report
}

/// Append the report for `findings` to the errors log. Nothing is written
/// when there are no findings.
pub fn log_validation_report(log_path: &Path, findings: &[Finding]) -> std::io::Result<()> {
    if findings.is_empty() {
        return Ok(());
    }
    write_error_to_log(
        log_path,
        "Sheet Validation Error Report",
        &format_validation_report(findings),
    )
}
