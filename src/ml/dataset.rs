//! Design-matrix construction
//!
//! Bridges the table engine and smartcore: selects numeric feature columns,
//! drops rows with missing values, and label-encodes classification targets.

use crate::ml::{ProblemType, TrainError};
use crate::table::DataFrame;
use smartcore::linalg::basic::matrix::DenseMatrix;
use std::collections::{BTreeMap, BTreeSet};

/// Feature matrix plus target vectors for supervised training
#[derive(Debug)]
pub struct SupervisedData {
    /// Feature matrix
    pub x: DenseMatrix<f64>,
    /// Raw feature rows (kept for metric computation)
    pub feature_rows: Vec<Vec<f64>>,
    /// Continuous target (regression)
    pub y_numeric: Vec<f64>,
    /// Encoded target (classification)
    pub y_labels: Vec<i32>,
    /// Class labels in encoding order; empty for regression
    pub classes: Vec<String>,
    /// Names of the feature columns, in matrix order
    pub feature_names: Vec<String>,
    /// Name of the target column
    pub target_column: String,
    /// Rows dropped because of missing values
    #[allow(dead_code)] // Reported in logs; asserted in tests
    pub rows_dropped: usize,
}

/// Feature matrix for unsupervised training
#[derive(Debug)]
pub struct UnsupervisedData {
    /// Feature matrix
    pub x: DenseMatrix<f64>,
    /// Raw feature rows (kept for inertia computation)
    pub feature_rows: Vec<Vec<f64>>,
    /// Names of the feature columns, in matrix order
    pub feature_names: Vec<String>,
    /// Rows dropped because of missing values
    #[allow(dead_code)] // Reported in logs; asserted in tests
    pub rows_dropped: usize,
}

/// Build the supervised design matrix from a table
///
/// The target defaults to the last column. Features are every numeric column
/// except the target; rows with a missing feature or target cell are dropped.
/// For classification the target is label-encoded over its distinct string
/// forms, sorted for a stable encoding.
pub fn build_supervised(
    df: &DataFrame,
    target: Option<&str>,
    problem_type: ProblemType,
) -> Result<SupervisedData, TrainError> {
    let target_index = match target {
        Some(name) => df
            .column_index(name)
            .ok_or_else(|| TrainError::UnknownTarget(name.to_string()))?,
        None => {
            if df.n_cols() == 0 {
                return Err(TrainError::NoRows("table has no columns".to_string()));
            }
            df.n_cols() - 1
        }
    };
    let target_column = df.columns()[target_index].clone();

    let feature_indices = numeric_feature_indices(df, Some(target_index));
    if feature_indices.is_empty() {
        return Err(TrainError::NoFeatures);
    }
    let feature_names: Vec<String> = feature_indices
        .iter()
        .map(|&i| df.columns()[i].clone())
        .collect();

    let mut feature_rows: Vec<Vec<f64>> = Vec::new();
    let mut target_cells = Vec::new();
    let mut rows_dropped = 0usize;

    for row in df.rows() {
        let features: Option<Vec<f64>> = feature_indices
            .iter()
            .map(|&i| row[i].as_f64())
            .collect();
        let target_cell = &row[target_index];

        let usable = match problem_type {
            ProblemType::Regression => target_cell.as_f64().is_some(),
            _ => !target_cell.is_null(),
        };

        match (features, usable) {
            (Some(features), true) => {
                feature_rows.push(features);
                target_cells.push(target_cell.clone());
            }
            _ => rows_dropped += 1,
        }
    }

    if feature_rows.is_empty() {
        return Err(TrainError::NoRows(format!(
            "all {} rows had missing values in the selected columns",
            df.n_rows()
        )));
    }

    let (y_numeric, y_labels, classes) = match problem_type {
        ProblemType::Regression => {
            let y: Vec<f64> = target_cells
                .iter()
                .map(|cell| cell.as_f64().expect("filtered above"))
                .collect();
            (y, Vec::new(), Vec::new())
        }
        _ => {
            let distinct: BTreeSet<String> =
                target_cells.iter().map(|cell| cell.to_csv_field()).collect();
            if distinct.len() < 2 {
                return Err(TrainError::InvalidTarget {
                    column: target_column,
                    reason: "classification needs at least two distinct classes".to_string(),
                });
            }
            // BTreeSet iteration gives a sorted, stable encoding
            let classes: Vec<String> = distinct.into_iter().collect();
            let encoding: BTreeMap<String, i32> = classes
                .iter()
                .enumerate()
                .map(|(i, label)| (label.clone(), i as i32))
                .collect();
            let y: Vec<i32> = target_cells
                .iter()
                .map(|cell| encoding[&cell.to_csv_field()])
                .collect();
            (Vec::new(), y, classes)
        }
    };

    if rows_dropped > 0 {
        tracing::info!(
            rows_dropped = rows_dropped,
            rows_used = feature_rows.len(),
            "Dropped rows with missing values while building design matrix"
        );
    }

    let x = DenseMatrix::from_2d_vec(&feature_rows);
    Ok(SupervisedData {
        x,
        feature_rows,
        y_numeric,
        y_labels,
        classes,
        feature_names,
        target_column,
        rows_dropped,
    })
}

/// Build the unsupervised design matrix: every numeric column is a feature.
pub fn build_unsupervised(df: &DataFrame) -> Result<UnsupervisedData, TrainError> {
    let feature_indices = numeric_feature_indices(df, None);
    if feature_indices.is_empty() {
        return Err(TrainError::NoFeatures);
    }
    let feature_names: Vec<String> = feature_indices
        .iter()
        .map(|&i| df.columns()[i].clone())
        .collect();

    let mut feature_rows: Vec<Vec<f64>> = Vec::new();
    let mut rows_dropped = 0usize;
    for row in df.rows() {
        let features: Option<Vec<f64>> = feature_indices
            .iter()
            .map(|&i| row[i].as_f64())
            .collect();
        match features {
            Some(features) => feature_rows.push(features),
            None => rows_dropped += 1,
        }
    }

    if feature_rows.is_empty() {
        return Err(TrainError::NoRows(format!(
            "all {} rows had missing values in the numeric columns",
            df.n_rows()
        )));
    }

    let x = DenseMatrix::from_2d_vec(&feature_rows);
    Ok(UnsupervisedData {
        x,
        feature_rows,
        feature_names,
        rows_dropped,
    })
}

/// Indices of columns whose dominant dtype is numeric, minus the target
fn numeric_feature_indices(df: &DataFrame, exclude: Option<usize>) -> Vec<usize> {
    (0..df.n_cols())
        .filter(|&i| Some(i) != exclude)
        .filter(|&i| matches!(df.column_dtype(i), "int" | "float"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Value;

    fn sample() -> DataFrame {
        DataFrame::new(
            vec![
                "height".to_string(),
                "weight".to_string(),
                "species".to_string(),
            ],
            vec![
                vec![
                    Value::Float(1.2),
                    Value::Int(30),
                    Value::Str("cat".to_string()),
                ],
                vec![
                    Value::Float(2.4),
                    Value::Int(60),
                    Value::Str("dog".to_string()),
                ],
                vec![Value::Float(1.1), Value::Null, Value::Str("cat".to_string())],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_supervised_defaults_to_last_column() {
        let data = build_supervised(&sample(), None, ProblemType::Classification).unwrap();
        assert_eq!(data.target_column, "species");
        assert_eq!(data.feature_names, vec!["height", "weight"]);
        // Row with the null weight drops out
        assert_eq!(data.feature_rows.len(), 2);
        assert_eq!(data.rows_dropped, 1);
        assert_eq!(data.classes, vec!["cat", "dog"]);
        assert_eq!(data.y_labels, vec![0, 1]);
    }

    #[test]
    fn test_supervised_unknown_target_rejected() {
        let err = build_supervised(&sample(), Some("missing"), ProblemType::Classification)
            .unwrap_err();
        assert!(matches!(err, TrainError::UnknownTarget(_)));
    }

    #[test]
    fn test_supervised_regression_needs_numeric_target() {
        let df = DataFrame::new(
            vec!["x".to_string(), "y".to_string()],
            vec![
                vec![Value::Int(1), Value::Str("label".to_string())],
                vec![Value::Int(2), Value::Str("label".to_string())],
            ],
        )
        .unwrap();
        let err = build_supervised(&df, Some("y"), ProblemType::Regression).unwrap_err();
        assert!(matches!(err, TrainError::NoRows(_)));
    }

    #[test]
    fn test_supervised_single_class_rejected() {
        let df = DataFrame::new(
            vec!["x".to_string(), "y".to_string()],
            vec![
                vec![Value::Int(1), Value::Str("only".to_string())],
                vec![Value::Int(2), Value::Str("only".to_string())],
            ],
        )
        .unwrap();
        let err = build_supervised(&df, None, ProblemType::Classification).unwrap_err();
        assert!(matches!(err, TrainError::InvalidTarget { .. }));
    }

    #[test]
    fn test_supervised_no_numeric_features() {
        let df = DataFrame::new(
            vec!["name".to_string(), "label".to_string()],
            vec![vec![
                Value::Str("a".to_string()),
                Value::Str("x".to_string()),
            ]],
        )
        .unwrap();
        let err = build_supervised(&df, None, ProblemType::Classification).unwrap_err();
        assert!(matches!(err, TrainError::NoFeatures));
    }

    #[test]
    fn test_unsupervised_uses_all_numeric_columns() {
        let data = build_unsupervised(&sample()).unwrap();
        assert_eq!(data.feature_names, vec!["height", "weight"]);
        assert_eq!(data.feature_rows.len(), 2);
        assert_eq!(data.rows_dropped, 1);
    }

    #[test]
    fn test_numeric_target_classification_labels() {
        let df = DataFrame::new(
            vec!["x".to_string(), "y".to_string()],
            vec![
                vec![Value::Int(1), Value::Int(0)],
                vec![Value::Int(2), Value::Int(1)],
                vec![Value::Int(3), Value::Int(0)],
            ],
        )
        .unwrap();
        let data = build_supervised(&df, None, ProblemType::Classification).unwrap();
        assert_eq!(data.classes, vec!["0", "1"]);
        assert_eq!(data.y_labels, vec![0, 1, 0]);
    }
}
