use calamine::{Data, Reader, Sheets, open_workbook_auto, open_workbook_auto_from_rs};
use serde_json::{Map, Value, json};
use std::collections::HashMap;
use std::io::{Cursor, Read, Seek};
use std::path::Path;
use thiserror::Error;

use crate::record::Sheet;
use crate::schema::RawRow;
use crate::utils::normalize_string;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Unable to open workbook: {0}")]
    Open(#[from] calamine::Error),

    #[error("Error reading sheet '{sheet}': {message}")]
    Sheet { sheet: String, message: String },

    #[error("Sheet '{sheet}' contains duplicate column headers:\n{details}")]
    DuplicateHeaders { sheet: String, details: String },
}

/// Decode every sheet of the workbook at `path`, in workbook order.
pub fn decode_workbook(path: &Path) -> Result<Vec<Sheet>, DecodeError> {
    let mut workbook = open_workbook_auto(path)?;
    read_sheets(&mut workbook)
}

/// Decode an uploaded workbook held in memory (.xlsx, .xls, .xlsb or .ods).
pub fn decode_bytes(bytes: Vec<u8>) -> Result<Vec<Sheet>, DecodeError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
    read_sheets(&mut workbook)
}

/// Nothing is returned unless every sheet decodes.
fn read_sheets<RS: Read + Seek>(workbook: &mut Sheets<RS>) -> Result<Vec<Sheet>, DecodeError> {
    let mut sheets = Vec::new();

    for sheet_name in workbook.sheet_names() {
        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| DecodeError::Sheet {
                sheet: sheet_name.clone(),
                message: e.to_string(),
            })?;

        let rows: Vec<Vec<Data>> = range.rows().map(|row| row.to_vec()).collect();
        let sheet = rows_to_sheet(&sheet_name, &rows)?;
        tracing::debug!(sheet = %sheet.name, rows = sheet.rows.len(), "decoded sheet");
        sheets.push(sheet);
    }

    Ok(sheets)
}

/// Turn a grid of cells into a sheet. The first row is the header; blank
/// rows are skipped and missing trailing cells become `null`.
pub fn rows_to_sheet(sheet_name: &str, rows: &[Vec<Data>]) -> Result<Sheet, DecodeError> {
    let Some((header_row, data_rows)) = rows.split_first() else {
        return Ok(Sheet::new(sheet_name, Vec::new()));
    };

    let headers: Vec<String> = header_row
        .iter()
        .map(|cell| normalize_string(&cell.to_string()))
        .collect();
    check_header_duplicates(sheet_name, &headers)?;

    let mut parsed_rows: Vec<RawRow> = Vec::new();
    for row in data_rows {
        if row.iter().all(is_blank_cell) {
            continue;
        }

        let mut json_obj = Map::new();
        for (col_idx, header) in headers.iter().enumerate() {
            if header.is_empty() {
                continue;
            }
            let value = row.get(col_idx).map(cell_to_json).unwrap_or(Value::Null);
            json_obj.insert(header.clone(), value);
        }
        parsed_rows.push(json_obj);
    }

    Ok(Sheet::new(sheet_name, parsed_rows))
}

/// Date cells become their serial number so the normalizer sees one epoch.
pub fn cell_to_json(cell: &Data) -> Value {
    match cell {
        Data::Empty | Data::Error(_) => Value::Null,
        Data::String(s) => Value::String(s.clone()),
        Data::Float(f) => float_to_json(*f),
        Data::Int(i) => json!(*i),
        Data::Bool(b) => Value::Bool(*b),
        Data::DateTime(dt) => float_to_json(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Value::String(s.clone()),
    }
}

fn float_to_json(f: f64) -> Value {
    if f.is_nan() || f.is_infinite() {
        return Value::Null;
    }

    if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
        json!(f as i64)
    } else {
        json!(f)
    }
}

fn is_blank_cell(cell: &Data) -> bool {
    match cell {
        Data::Empty | Data::Error(_) => true,
        Data::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn check_header_duplicates(sheet_name: &str, headers: &[String]) -> Result<(), DecodeError> {
    let mut header_positions: HashMap<&str, Vec<usize>> = HashMap::new();
    for (index, header) in headers.iter().enumerate() {
        if !header.is_empty() {
            header_positions.entry(header.as_str()).or_default().push(index);
        }
    }

    let mut duplicates: Vec<(&str, Vec<usize>)> = header_positions
        .into_iter()
        .filter(|(_, positions)| positions.len() > 1)
        .collect();
    if duplicates.is_empty() {
        return Ok(());
    }
    duplicates.sort_by_key(|(_, positions)| positions[0]);

    let details = duplicates
        .iter()
        .map(|(header, positions)| {
            let columns = positions
                .iter()
                .map(|p| format!("column {}", p + 1))
                .collect::<Vec<_>>()
                .join(", ");
            format!("  • Header '{}' appears in: {}", header, columns)
        })
        .collect::<Vec<_>>()
        .join("\n");

    Err(DecodeError::DuplicateHeaders {
        sheet: sheet_name.to_string(),
        details,
    })
}
