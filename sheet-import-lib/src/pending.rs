//! Validated workbooks waiting for the import call.
//!
//! Validation hands out a token only when the workbook can be imported;
//! `take` returns the sheets for that token once and only once, and only
//! before the entry expires.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::pipeline::{WorkbookPreview, preview_workbook};
use crate::record::Sheet;
use crate::row_validator::RowValidator;

pub const DEFAULT_PENDING_TTL_MINUTES: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImportToken(Uuid);

impl ImportToken {
    fn generate() -> Self {
        ImportToken(Uuid::new_v4())
    }
}

impl fmt::Display for ImportToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for ImportToken {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(ImportToken)
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PendingError {
    #[error("No pending import for token {0}. It may have been used already.")]
    Unknown(ImportToken),

    #[error("Pending import {0} has expired. Please upload the file again.")]
    Expired(ImportToken),
}

struct PendingEntry {
    sheets: Vec<Sheet>,
    expires_at: DateTime<Utc>,
}

pub struct PendingImports {
    entries: HashMap<ImportToken, PendingEntry>,
    ttl: Duration,
}

impl Default for PendingImports {
    fn default() -> Self {
        Self::new(Duration::minutes(DEFAULT_PENDING_TTL_MINUTES))
    }
}

impl PendingImports {
    pub fn new(ttl: Duration) -> Self {
        PendingImports {
            entries: HashMap::new(),
            ttl,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Preview the workbook and park it for import. No token is issued when
    /// the preview has any error finding.
    pub fn validate_and_stash(
        &mut self,
        sheets: Vec<Sheet>,
        validator: &RowValidator,
    ) -> (WorkbookPreview, Option<ImportToken>) {
        self.validate_and_stash_at(sheets, validator, Utc::now())
    }

    pub fn validate_and_stash_at(
        &mut self,
        sheets: Vec<Sheet>,
        validator: &RowValidator,
        now: DateTime<Utc>,
    ) -> (WorkbookPreview, Option<ImportToken>) {
        let preview = preview_workbook(&sheets, validator);
        if !preview.can_import() {
            tracing::debug!("preview has errors, no pending import created");
            return (preview, None);
        }
        let token = self.stash_at(sheets, now);
        (preview, Some(token))
    }

    #[cfg(test)]
    fn stash(&mut self, sheets: Vec<Sheet>) -> ImportToken {
        self.stash_at(sheets, Utc::now())
    }

    fn stash_at(&mut self, sheets: Vec<Sheet>, now: DateTime<Utc>) -> ImportToken {
        let token = ImportToken::generate();
        self.entries.insert(
            token,
            PendingEntry {
                sheets,
                expires_at: now + self.ttl,
            },
        );
        tracing::debug!(%token, "stashed pending import");
        token
    }

    pub fn take(&mut self, token: ImportToken) -> Result<Vec<Sheet>, PendingError> {
        self.take_at(token, Utc::now())
    }

    /// The entry is removed whether or not it has expired.
    pub fn take_at(
        &mut self,
        token: ImportToken,
        now: DateTime<Utc>,
    ) -> Result<Vec<Sheet>, PendingError> {
        let entry = self
            .entries
            .remove(&token)
            .ok_or(PendingError::Unknown(token))?;

        if now >= entry.expires_at {
            return Err(PendingError::Expired(token));
        }
        Ok(entry.sheets)
    }

    /// Drop expired entries; returns how many were removed.
    pub fn purge_expired(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| now < entry.expires_at);
        before - self.entries.len()
    }
}
