//! Dataset readers
//!
//! Parses uploaded bytes into a [`DataFrame`], with the reader picked by
//! file extension.

use crate::table::{DataFrame, TableError, Value};
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use std::collections::HashSet;
use std::io::Cursor;

/// Supported upload formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// Comma-separated values
    Csv,
    /// Tab-separated values
    Tsv,
    /// JSON array of record objects
    Json,
    /// Newline-delimited JSON records
    NdJson,
    /// Legacy Excel workbook
    Xls,
    /// Excel workbook
    Xlsx,
}

impl FileFormat {
    /// Detect the format from a filename extension.
    ///
    /// Returns `None` for unsupported extensions; callers surface that as a
    /// 400 naming the offending suffix.
    pub fn from_filename(filename: &str) -> Option<FileFormat> {
        let ext = filename.rsplit_once('.').map(|(_, e)| e.to_ascii_lowercase())?;
        match ext.as_str() {
            "csv" => Some(FileFormat::Csv),
            "tsv" => Some(FileFormat::Tsv),
            "json" => Some(FileFormat::Json),
            "ndjson" | "jsonl" => Some(FileFormat::NdJson),
            "xls" => Some(FileFormat::Xls),
            "xlsx" => Some(FileFormat::Xlsx),
            _ => None,
        }
    }
}

/// Parse uploaded bytes into a table using the given format.
pub fn read_table(format: FileFormat, bytes: &[u8]) -> Result<DataFrame, TableError> {
    match format {
        FileFormat::Csv => read_delimited(bytes, b','),
        FileFormat::Tsv => read_delimited(bytes, b'\t'),
        FileFormat::Json => read_json_records(bytes),
        FileFormat::NdJson => read_ndjson(bytes),
        FileFormat::Xls | FileFormat::Xlsx => read_spreadsheet(bytes),
    }
}

/// Parse a delimited text file. The first record is the header.
fn read_delimited(bytes: &[u8], delimiter: u8) -> Result<DataFrame, TableError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    if headers.is_empty() {
        return Err(TableError::Empty("no header row".to_string()));
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(Value::infer).collect::<Vec<_>>());
    }
    DataFrame::new(headers, rows)
}

/// Parse a JSON array of record objects.
///
/// Column order follows first appearance across records; records missing a
/// key get `Null` in that column.
fn read_json_records(bytes: &[u8]) -> Result<DataFrame, TableError> {
    let parsed: serde_json::Value = serde_json::from_slice(bytes)?;
    let records = parsed
        .as_array()
        .ok_or_else(|| TableError::Empty("expected a JSON array of records".to_string()))?;
    frame_from_records(records)
}

/// Parse newline-delimited JSON, one record object per line.
fn read_ndjson(bytes: &[u8]) -> Result<DataFrame, TableError> {
    let text = String::from_utf8_lossy(bytes);
    let mut records = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        records.push(serde_json::from_str::<serde_json::Value>(line)?);
    }
    frame_from_records(&records)
}

fn frame_from_records(records: &[serde_json::Value]) -> Result<DataFrame, TableError> {
    if records.is_empty() {
        return Err(TableError::Empty("no records".to_string()));
    }

    let mut columns: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    for record in records {
        let object = record
            .as_object()
            .ok_or_else(|| TableError::Empty("records must be JSON objects".to_string()))?;
        for key in object.keys() {
            if seen.insert(key.clone()) {
                columns.push(key.clone());
            }
        }
    }

    let rows = records
        .iter()
        .map(|record| {
            let object = record.as_object().expect("validated above");
            columns
                .iter()
                .map(|column| {
                    object
                        .get(column)
                        .map(Value::from_json)
                        .unwrap_or(Value::Null)
                })
                .collect::<Vec<_>>()
        })
        .collect();

    DataFrame::new(columns, rows)
}

/// Parse the first worksheet of an Excel workbook. The first row is the
/// header; blank header cells get positional names.
fn read_spreadsheet(bytes: &[u8]) -> Result<DataFrame, TableError> {
    let cursor = Cursor::new(bytes.to_vec());
    let mut workbook = open_workbook_auto_from_rs(cursor)
        .map_err(|e| TableError::Spreadsheet(e.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| TableError::Empty("workbook has no sheets".to_string()))?
        .map_err(|e| TableError::Spreadsheet(e.to_string()))?;

    let mut rows_iter = range.rows();
    let header_cells = rows_iter
        .next()
        .ok_or_else(|| TableError::Empty("sheet has no rows".to_string()))?;

    let headers: Vec<String> = header_cells
        .iter()
        .enumerate()
        .map(|(i, cell)| {
            let name = cell_to_value(cell).to_csv_field().trim().to_string();
            if name.is_empty() {
                format!("column_{}", i)
            } else {
                name
            }
        })
        .collect();

    let rows: Vec<Vec<Value>> = rows_iter
        .map(|row| row.iter().map(cell_to_value).collect())
        .collect();

    DataFrame::new(headers, rows)
}

fn cell_to_value(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::Null,
        Data::Int(i) => Value::Int(*i),
        Data::Float(f) => Value::Float(*f),
        Data::Bool(b) => Value::Bool(*b),
        Data::String(s) => Value::infer(s),
        Data::DateTime(dt) => Value::Float(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Value::Str(s.clone()),
        Data::Error(_) => Value::Null,
    }
}
