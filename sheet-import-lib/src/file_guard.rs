//! Cheap checks on an uploaded file before it is decoded or sent anywhere.

use std::path::Path;

use crate::schema::MAX_FILE_SIZE;

pub const XLSX_MIME_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const XLS_MIME_TYPE: &str = "application/vnd.ms-excel";

const ACCEPTED_EXTENSIONS: [&str; 2] = ["xlsx", "xls"];
const ACCEPTED_MIME_TYPES: [&str; 2] = [XLSX_MIME_TYPE, XLS_MIME_TYPE];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCandidate {
    pub file_name: String,
    pub mime_type: String,
    pub size: u64,
}

impl FileCandidate {
    /// Describe a file on disk. The MIME type is derived from the extension.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let metadata = std::fs::metadata(path)?;
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default()
            .to_string();

        Ok(FileCandidate {
            mime_type: mime_type_for(&file_name).unwrap_or_default().to_string(),
            file_name,
            size: metadata.len(),
        })
    }
}

pub fn mime_type_for(file_name: &str) -> Option<&'static str> {
    match extension_of(file_name)?.as_str() {
        "xlsx" => Some(XLSX_MIME_TYPE),
        "xls" => Some(XLS_MIME_TYPE),
        _ => None,
    }
}

/// `None` when the file may be uploaded, otherwise the reason it may not.
pub fn check_file(candidate: &FileCandidate) -> Option<String> {
    let has_accepted_extension = extension_of(&candidate.file_name)
        .map(|ext| ACCEPTED_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false);
    if !has_accepted_extension {
        return Some("Please upload an Excel file (.xlsx or .xls)".to_string());
    }

    if !ACCEPTED_MIME_TYPES.contains(&candidate.mime_type.as_str()) {
        return Some(format!(
            "Unsupported file type '{}'. Please upload an Excel file.",
            candidate.mime_type
        ));
    }

    if candidate.size == 0 {
        return Some("The file is empty".to_string());
    }

    if candidate.size > MAX_FILE_SIZE {
        return Some(format!(
            "File is too large ({:.1} MB). Maximum size is 10 MB.",
            candidate.size as f64 / (1024.0 * 1024.0)
        ));
    }

    None
}

fn extension_of(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}
