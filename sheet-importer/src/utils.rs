use std::path::Path;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use sheet_import_lib::utils::{get_local_datetime_with_format, normalize_string};
use sheet_import_lib::{FailurePayload, Sheet, TransportFailure};

#[derive(Serialize)]
struct ImportRequest<'a> {
    sheets: &'a [Sheet],
}

#[derive(Debug, Default, Deserialize)]
pub struct ImportResponse {
    #[serde(default)]
    pub inserted: Option<usize>,
    #[serde(default)]
    pub message: Option<String>,
}

pub fn generate_unique_filename(workbook_path: &Path) -> String {
    let timestamp = get_local_datetime_with_format("%Y-%m-%d_%H-%M-%S");
    let stem = workbook_path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("records");
    let stem = normalize_string(stem).replace(' ', "_");
    let filename = format!("{stem}_{timestamp}.csv");
    return filename.to_lowercase();
}

/// Keep only the requested sheet, or every sheet when none is named.
pub fn select_sheets(sheets: Vec<Sheet>, sheet_name: Option<&str>) -> anyhow::Result<Vec<Sheet>> {
    let Some(sheet_name) = sheet_name else {
        return Ok(sheets);
    };

    let available: Vec<String> = sheets.iter().map(|sheet| sheet.name.clone()).collect();
    let selected: Vec<Sheet> = sheets
        .into_iter()
        .filter(|sheet| sheet.name == sheet_name)
        .collect();
    if selected.is_empty() {
        return Err(anyhow::anyhow!(
            "Sheet \"{sheet_name}\" not found. Available sheets: {}",
            available.join(", ")
        ));
    }
    Ok(selected)
}

// Post the decoded sheets to the remote import endpoint
pub fn submit_sheets(
    url: &str,
    sheets: &[Sheet],
    client: &Client,
) -> Result<ImportResponse, TransportFailure> {
    let endpoint_url = format!("{}/api/import", url.trim_end_matches('/'));
    tracing::debug!(endpoint = %endpoint_url, sheets = sheets.len(), "submitting workbook");

    let response = client
        .post(&endpoint_url)
        .json(&ImportRequest { sheets })
        .send()
        .map_err(request_failure)?;

    let status = response.status();
    if status.is_success() {
        // An empty or non-JSON success body still counts as accepted
        return Ok(response.json().unwrap_or_default());
    }

    let payload = response.json::<FailurePayload>().ok();
    Err(TransportFailure::Response {
        status: status.as_u16(),
        payload,
    })
}

fn request_failure(error: reqwest::Error) -> TransportFailure {
    tracing::debug!(%error, "request failed before a response arrived");
    failure_without_response(error.is_timeout())
}

fn failure_without_response(timed_out: bool) -> TransportFailure {
    if timed_out {
        TransportFailure::Aborted
    } else {
        TransportFailure::NoResponse
    }
}
