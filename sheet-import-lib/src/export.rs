use anyhow::Result;
use std::path::Path;

use crate::record::PersistedRecord;
use crate::schema::{AMOUNT_COLUMN, DATE_COLUMN, NAME_COLUMN, VERIFIED_COLUMN};

const SHEET_COLUMN: &str = "Sheet";

/// Write imported records to CSV, one row per record, schema columns first.
pub fn export_to_csv(records: &[PersistedRecord], csv_path: &Path) -> Result<()> {
    // Quote fields only when necessary (e.g., when they contain commas)
    let mut wtr = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Necessary)
        .from_path(csv_path)?;

    wtr.write_record([
        NAME_COLUMN,
        AMOUNT_COLUMN,
        DATE_COLUMN,
        VERIFIED_COLUMN,
        SHEET_COLUMN,
    ])?;

    for record in records {
        wtr.write_record([
            record.name.clone(),
            record.amount.to_string(),
            record.date.format("%Y-%m-%d").to_string(),
            record.verified.to_string(),
            record.sheet_name.clone(),
        ])?;
    }

    wtr.flush()?;
    tracing::info!(path = %csv_path.display(), rows = records.len(), "exported CSV");
    Ok(())
}
