//! Document storage for imported records.
//!
//! Writes are unordered bulk inserts: a record that fails does not stop the
//! rest, and only aggregate counts are reported.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::record::PersistedRecord;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt document at line {line}: {source}")]
    Corrupt {
        line: usize,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InsertSummary {
    pub inserted: usize,
    pub failed: usize,
}

impl InsertSummary {
    pub fn is_complete(&self) -> bool {
        self.failed == 0
    }
}

pub trait RecordStore {
    fn insert_many(&mut self, records: &[PersistedRecord]) -> Result<InsertSummary, StoreError>;

    fn count(&self) -> Result<usize, StoreError>;
}

/// One JSON document per line, append only.
pub struct JsonLinesStore {
    path: PathBuf,
}

impl JsonLinesStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        OpenOptions::new().create(true).append(true).open(path)?;
        Ok(JsonLinesStore {
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Vec<PersistedRecord>, StoreError> {
        let reader = BufReader::new(File::open(&self.path)?);
        let mut records = Vec::new();

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record = serde_json::from_str(&line).map_err(|source| StoreError::Corrupt {
                line: index + 1,
                source,
            })?;
            records.push(record);
        }

        Ok(records)
    }
}

impl RecordStore for JsonLinesStore {
    fn insert_many(&mut self, records: &[PersistedRecord]) -> Result<InsertSummary, StoreError> {
        let file = OpenOptions::new().append(true).open(&self.path)?;
        let mut writer = BufWriter::new(file);
        let mut summary = InsertSummary::default();

        for record in records {
            let written = serde_json::to_string(record)
                .map_err(std::io::Error::from)
                .and_then(|line| writeln!(writer, "{line}"));
            match written {
                Ok(()) => summary.inserted += 1,
                Err(e) => {
                    tracing::warn!("failed to write record: {e}");
                    summary.failed += 1;
                }
            }
        }
        writer.flush()?;

        tracing::info!(
            path = %self.path.display(),
            inserted = summary.inserted,
            failed = summary.failed,
            "bulk insert finished"
        );
        Ok(summary)
    }

    fn count(&self) -> Result<usize, StoreError> {
        Ok(self.load()?.len())
    }
}

/// In-memory store. An optional capacity makes inserts past it fail.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Vec<PersistedRecord>,
    capacity: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity_limit(capacity: usize) -> Self {
        MemoryStore {
            records: Vec::new(),
            capacity: Some(capacity),
        }
    }

    pub fn records(&self) -> &[PersistedRecord] {
        &self.records
    }
}

impl RecordStore for MemoryStore {
    fn insert_many(&mut self, records: &[PersistedRecord]) -> Result<InsertSummary, StoreError> {
        let mut summary = InsertSummary::default();

        for record in records {
            let full = self
                .capacity
                .map(|capacity| self.records.len() >= capacity)
                .unwrap_or(false);
            if full {
                summary.failed += 1;
            } else {
                self.records.push(record.clone());
                summary.inserted += 1;
            }
        }

        Ok(summary)
    }

    fn count(&self) -> Result<usize, StoreError> {
        Ok(self.records.len())
    }
}
