//! In-memory table representation
//!
//! A small column-typed table that backs cleaning sessions and training
//! requests. Cells are dynamically typed; readers infer types per cell.

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashSet;
use thiserror::Error;

/// Errors produced while constructing or serializing tables
#[derive(Error, Debug)]
pub enum TableError {
    /// Two columns share the same name
    #[error("Duplicate column name: {0}")]
    DuplicateColumn(String),

    /// A row's cell count disagrees with the header
    #[error("Row {row} has {got} cells, expected {expected}")]
    RaggedRow {
        /// Zero-based row index
        row: usize,
        /// Observed cell count
        got: usize,
        /// Header cell count
        expected: usize,
    },

    /// CSV parse or write failure
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// CSV writer flush failure
    #[error("CSV write error: {0}")]
    CsvWrite(String),

    /// JSON parse failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Spreadsheet parse failure
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),

    /// Input contained no usable table
    #[error("Empty dataset: {0}")]
    Empty(String),
}

/// A single cell value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Missing value
    Null,
    /// 64-bit integer
    Int(i64),
    /// 64-bit float
    Float(f64),
    /// Boolean
    Bool(bool),
    /// UTF-8 string
    Str(String),
}

impl Value {
    /// Infer a typed value from a raw text cell.
    ///
    /// Empty text becomes `Null`; otherwise integer, float, and boolean
    /// parses are attempted in that order before falling back to `Str`.
    pub fn infer(raw: &str) -> Value {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Value::Null;
        }
        if let Ok(i) = trimmed.parse::<i64>() {
            return Value::Int(i);
        }
        if let Ok(f) = trimmed.parse::<f64>() {
            return Value::Float(f);
        }
        match trimmed.to_ascii_lowercase().as_str() {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => Value::Str(raw.to_string()),
        }
    }

    /// Convert a JSON value into a cell value.
    ///
    /// Nested arrays and objects are stringified rather than rejected, so
    /// records with non-scalar fields still load as text columns.
    pub fn from_json(value: &serde_json::Value) -> Value {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::Str(s.clone()),
            other => Value::Str(other.to_string()),
        }
    }

    /// Render the value as JSON. Non-finite floats become null so previews
    /// stay valid JSON.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Int(i) => json!(i),
            Value::Float(f) => {
                if f.is_finite() {
                    json!(f)
                } else {
                    serde_json::Value::Null
                }
            }
            Value::Bool(b) => json!(b),
            Value::Str(s) => json!(s),
        }
    }

    /// Render the value as a CSV field. `Null` becomes the empty string.
    pub fn to_csv_field(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Str(s) => s.clone(),
        }
    }

    /// Numeric view of the cell, if it has one
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// True when the cell is missing
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Stable string key for equality-based grouping (deduplication)
    pub fn dedup_key(&self) -> String {
        match self {
            Value::Null => "∅".to_string(),
            Value::Int(i) => format!("i:{}", i),
            Value::Float(f) => format!("f:{}", f),
            Value::Bool(b) => format!("b:{}", b),
            Value::Str(s) => format!("s:{}", s),
        }
    }
}

/// An in-memory table: ordered column names plus row-major cells
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataFrame {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl DataFrame {
    /// Build a table, validating headers and row widths.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self, TableError> {
        let mut seen = HashSet::new();
        for name in &columns {
            if !seen.insert(name.clone()) {
                return Err(TableError::DuplicateColumn(name.clone()));
            }
        }
        for (i, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(TableError::RaggedRow {
                    row: i,
                    got: row.len(),
                    expected: columns.len(),
                });
            }
        }
        Ok(Self { columns, rows })
    }

    /// Column names in order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// All rows
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Number of rows
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns
    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    /// Index of a column by name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Dominant non-null dtype of a column, or "null" for all-missing columns
    pub fn column_dtype(&self, index: usize) -> &'static str {
        let mut counts: [(usize, &'static str); 4] =
            [(0, "int"), (0, "float"), (0, "bool"), (0, "string")];
        for row in &self.rows {
            match row[index] {
                Value::Int(_) => counts[0].0 += 1,
                Value::Float(_) => counts[1].0 += 1,
                Value::Bool(_) => counts[2].0 += 1,
                Value::Str(_) => counts[3].0 += 1,
                Value::Null => {}
            }
        }
        counts
            .iter()
            .max_by_key(|(n, _)| *n)
            .filter(|(n, _)| *n > 0)
            .map(|(_, name)| *name)
            .unwrap_or("null")
    }

    /// First `n` rows as JSON records
    pub fn head_records(&self, n: usize) -> Vec<serde_json::Value> {
        self.rows
            .iter()
            .take(n)
            .map(|row| {
                let mut record = serde_json::Map::new();
                for (name, cell) in self.columns.iter().zip(row) {
                    record.insert(name.clone(), cell.to_json());
                }
                serde_json::Value::Object(record)
            })
            .collect()
    }

    // Mutation primitives used by the cleaning executor. They preserve the
    // row-width invariant by construction.

    pub(crate) fn rows_mut(&mut self) -> &mut Vec<Vec<Value>> {
        &mut self.rows
    }

    pub(crate) fn rename_column(&mut self, index: usize, to: String) {
        self.columns[index] = to;
    }

    pub(crate) fn remove_columns(&mut self, indices: &[usize]) {
        let drop: HashSet<usize> = indices.iter().copied().collect();
        self.columns = self
            .columns
            .iter()
            .enumerate()
            .filter(|(i, _)| !drop.contains(i))
            .map(|(_, c)| c.clone())
            .collect();
        for row in &mut self.rows {
            let mut kept = Vec::with_capacity(row.len() - drop.len());
            for (i, cell) in row.drain(..).enumerate() {
                if !drop.contains(&i) {
                    kept.push(cell);
                }
            }
            *row = kept;
        }
    }

    pub(crate) fn retain_rows<F: FnMut(&[Value]) -> bool>(&mut self, mut keep: F) {
        self.rows.retain(|row| keep(row));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DataFrame {
        DataFrame::new(
            vec!["name".to_string(), "age".to_string()],
            vec![
                vec![Value::Str("ada".to_string()), Value::Int(36)],
                vec![Value::Str("grace".to_string()), Value::Null],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_infer_types() {
        assert_eq!(Value::infer(""), Value::Null);
        assert_eq!(Value::infer("42"), Value::Int(42));
        assert_eq!(Value::infer("4.5"), Value::Float(4.5));
        assert_eq!(Value::infer("TRUE"), Value::Bool(true));
        assert_eq!(Value::infer("hello"), Value::Str("hello".to_string()));
    }

    #[test]
    fn test_infer_keeps_leading_zero_strings_as_int() {
        // "007" parses as 7; type inference coerces numeric-looking text
        // on purpose.
        assert_eq!(Value::infer("007"), Value::Int(7));
    }

    #[test]
    fn test_duplicate_columns_rejected() {
        let result = DataFrame::new(
            vec!["a".to_string(), "a".to_string()],
            vec![vec![Value::Int(1), Value::Int(2)]],
        );
        assert!(matches!(result, Err(TableError::DuplicateColumn(_))));
    }

    #[test]
    fn test_ragged_row_rejected() {
        let result = DataFrame::new(
            vec!["a".to_string(), "b".to_string()],
            vec![vec![Value::Int(1)]],
        );
        assert!(matches!(result, Err(TableError::RaggedRow { .. })));
    }

    #[test]
    fn test_head_records_scrubs_non_finite() {
        let df = DataFrame::new(
            vec!["x".to_string()],
            vec![vec![Value::Float(f64::NAN)], vec![Value::Float(1.5)]],
        )
        .unwrap();
        let records = df.head_records(5);
        assert_eq!(records.len(), 2);
        assert!(records[0]["x"].is_null());
        assert_eq!(records[1]["x"], serde_json::json!(1.5));
    }

    #[test]
    fn test_column_dtype_majority() {
        let df = DataFrame::new(
            vec!["v".to_string()],
            vec![
                vec![Value::Int(1)],
                vec![Value::Int(2)],
                vec![Value::Str("n/a".to_string())],
                vec![Value::Null],
            ],
        )
        .unwrap();
        assert_eq!(df.column_dtype(0), "int");
    }

    #[test]
    fn test_remove_columns() {
        let mut df = sample();
        df.remove_columns(&[0]);
        assert_eq!(df.columns(), &["age".to_string()]);
        assert_eq!(df.rows()[0], vec![Value::Int(36)]);
    }

    #[test]
    fn test_head_records_shape() {
        let df = sample();
        let records = df.head_records(1);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["name"], serde_json::json!("ada"));
        assert_eq!(records[0]["age"], serde_json::json!(36));
    }
}
