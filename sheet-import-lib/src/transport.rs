//! Maps failed import requests to one display message.
//!
//! Server rejections carry the same [`Finding`] shape the local row checks
//! produce, so a rejected submit reads like a failed preview.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::finding::Finding;

pub const NO_RESPONSE_MESSAGE: &str =
    "Unable to reach the server. Please check your connection and try again.";
pub const TIMEOUT_MESSAGE: &str = "The request timed out. Please try again.";

/// Body of a failed import response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FailurePayload {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<Finding>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl FailurePayload {
    /// Payload for a submission rejected by validation.
    pub fn rejected(findings: Vec<Finding>) -> Self {
        FailurePayload {
            success: false,
            error: Some("Validation failed".to_string()),
            errors: Some(findings),
            message: None,
        }
    }

    /// Message shown for this payload, if it carries one.
    pub fn primary_message(&self) -> Option<String> {
        let first_error = self
            .errors
            .as_deref()
            .and_then(|findings| findings.iter().find(|f| f.is_error()))
            .map(|f| f.message.clone());

        first_error
            .or_else(|| self.error.clone())
            .or_else(|| self.message.clone())
            .filter(|message| !message.trim().is_empty())
    }
}

#[derive(Debug, Clone, Error)]
pub enum TransportFailure {
    #[error("server responded with status {status}")]
    Response {
        status: u16,
        payload: Option<FailurePayload>,
    },

    #[error("no response from server")]
    NoResponse,

    #[error("request aborted")]
    Aborted,
}

impl TransportFailure {
    /// The single string shown to the user.
    pub fn display_message(&self) -> String {
        match self {
            TransportFailure::Response { status, payload } => payload
                .as_ref()
                .and_then(FailurePayload::primary_message)
                .unwrap_or_else(|| status_message(*status)),
            TransportFailure::NoResponse => NO_RESPONSE_MESSAGE.to_string(),
            TransportFailure::Aborted => TIMEOUT_MESSAGE.to_string(),
        }
    }
}

pub fn status_message(status: u16) -> String {
    let message = match status {
        400 => "Invalid request. Please check the file and try again.",
        401 => "Your session has expired. Please sign in again.",
        403 => "You do not have permission to import this data.",
        404 => "The import service could not be found.",
        409 => "This data conflicts with records that already exist.",
        413 => "The file is too large to upload. Maximum size is 10 MB.",
        415 => "Unsupported file type. Please upload an .xlsx or .xls file.",
        422 => "The file contains data that could not be processed.",
        429 => "Too many requests. Please wait a moment and try again.",
        500 => "The server encountered an error. Please try again later.",
        502 | 503 => "The import service is temporarily unavailable. Please try again later.",
        504 => "The server took too long to respond. Please try again.",
        _ => return format!("Request failed with status {status}"),
    };
    message.to_string()
}
