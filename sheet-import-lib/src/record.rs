use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::schema::RawRow;

/// One named table of a workbook.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<RawRow>,
}

impl Sheet {
    pub fn new(name: &str, rows: Vec<RawRow>) -> Self {
        Sheet {
            name: name.to_string(),
            rows,
        }
    }

    /// Header of the sheet, taken from the keys of its first row.
    pub fn header(&self) -> Vec<String> {
        self.rows
            .first()
            .map(|row| row.keys().cloned().collect())
            .unwrap_or_default()
    }
}

/// A row whose schema fields have their final types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRow {
    pub name: String,
    pub amount: f64,
    pub date: NaiveDate,
    pub verified: bool,
    /// Columns outside the schema, carried but never validated
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

/// Shape of a stored document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedRecord {
    pub name: String,
    pub amount: f64,
    pub date: NaiveDate,
    pub verified: bool,
    pub sheet_name: String,
    #[serde(default = "Utc::now")]
    pub imported_at: DateTime<Utc>,
}

impl PersistedRecord {
    pub fn from_canonical(row: CanonicalRow, sheet_name: &str, imported_at: DateTime<Utc>) -> Self {
        PersistedRecord {
            name: row.name,
            amount: row.amount,
            date: row.date,
            verified: row.verified,
            sheet_name: sheet_name.to_string(),
            imported_at,
        }
    }
}
