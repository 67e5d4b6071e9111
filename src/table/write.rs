//! CSV serialization for tables
//!
//! Everything persisted to the dataset hub goes through CSV, whatever the
//! upload format was.

use crate::table::{DataFrame, TableError};

/// Serialize a table to CSV bytes. `Null` cells become empty fields.
pub fn to_csv_bytes(df: &DataFrame) -> Result<Vec<u8>, TableError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(df.columns())?;
    for row in df.rows() {
        writer.write_record(row.iter().map(|cell| cell.to_csv_field()))?;
    }
    writer
        .into_inner()
        .map_err(|e| TableError::CsvWrite(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{read_table, FileFormat, Value};

    #[test]
    fn test_round_trip_preserves_shape() {
        let df = DataFrame::new(
            vec!["name".to_string(), "age".to_string()],
            vec![
                vec![Value::Str("ada".to_string()), Value::Int(36)],
                vec![Value::Str("grace".to_string()), Value::Null],
            ],
        )
        .unwrap();

        let bytes = to_csv_bytes(&df).unwrap();
        let parsed = read_table(FileFormat::Csv, &bytes).unwrap();
        assert_eq!(parsed.columns(), df.columns());
        assert_eq!(parsed.n_rows(), 2);
        assert_eq!(parsed.rows()[1][1], Value::Null);
    }

    #[test]
    fn test_quotes_fields_with_commas() {
        let df = DataFrame::new(
            vec!["note".to_string()],
            vec![vec![Value::Str("a, b".to_string())]],
        )
        .unwrap();
        let bytes = to_csv_bytes(&df).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("\"a, b\""));
    }
}
