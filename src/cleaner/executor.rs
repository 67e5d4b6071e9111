//! Cleaning plan executor
//!
//! Interprets a validated [`CleaningPlan`] against a table. Execution is
//! all-or-nothing: operations run on a working copy and the caller only
//! stores the result when every operation succeeded.

use crate::cleaner::plan::{CastDType, CleaningOp, CleaningPlan, Comparison};
use crate::table::{DataFrame, Value};
use std::collections::HashSet;
use thiserror::Error;

/// Errors raised while executing a cleaning plan
#[derive(Error, Debug)]
pub enum CleanError {
    /// An operation referenced a column the table does not have
    #[error("unknown column '{column}' in {op}")]
    UnknownColumn {
        /// Description of the failing operation
        op: String,
        /// The missing column
        column: String,
    },

    /// An operation failed for a reason other than a missing column
    #[error("{op} failed: {reason}")]
    OpFailed {
        /// Description of the failing operation
        op: String,
        /// Failure detail
        reason: String,
    },
}

/// Summary of an executed plan
#[derive(Debug, Clone)]
pub struct CleanReport {
    /// Row count before the first operation
    pub rows_before: usize,
    /// Row count after the last operation
    pub rows_after: usize,
    /// Number of operations applied
    pub operations_applied: usize,
}

/// Apply a plan to a table, returning the cleaned copy and a report.
///
/// The input table is not modified; on error the caller's table is
/// untouched and the error names the offending operation.
pub fn apply_plan(df: &DataFrame, plan: &CleaningPlan) -> Result<(DataFrame, CleanReport), CleanError> {
    let mut working = df.clone();
    let rows_before = working.n_rows();

    for op in &plan.operations {
        apply_op(&mut working, op)?;
        tracing::debug!(
            op = %op.describe(),
            rows = working.n_rows(),
            "Applied cleaning operation"
        );
    }

    let report = CleanReport {
        rows_before,
        rows_after: working.n_rows(),
        operations_applied: plan.operations.len(),
    };
    Ok((working, report))
}

fn apply_op(df: &mut DataFrame, op: &CleaningOp) -> Result<(), CleanError> {
    match op {
        CleaningOp::DropNulls { columns } => {
            let indices = resolve_columns(df, columns.as_deref(), op)?;
            df.retain_rows(|row| !indices.iter().any(|&i| row[i].is_null()));
            Ok(())
        }
        CleaningOp::FillNulls { column, value } => {
            let index = resolve_column(df, column, op)?;
            let fill = Value::from_json(value);
            for row in df.rows_mut() {
                if row[index].is_null() {
                    row[index] = fill.clone();
                }
            }
            Ok(())
        }
        CleaningOp::DropColumns { columns } => {
            let indices = resolve_columns(df, Some(columns), op)?;
            if indices.len() == df.n_cols() {
                return Err(CleanError::OpFailed {
                    op: op.describe(),
                    reason: "cannot drop every column".to_string(),
                });
            }
            df.remove_columns(&indices);
            Ok(())
        }
        CleaningOp::RenameColumn { from, to } => {
            let index = resolve_column(df, from, op)?;
            if df.column_index(to).is_some() {
                return Err(CleanError::OpFailed {
                    op: op.describe(),
                    reason: format!("column '{}' already exists", to),
                });
            }
            df.rename_column(index, to.clone());
            Ok(())
        }
        CleaningOp::DropDuplicates { columns } => {
            let indices = resolve_columns(df, columns.as_deref(), op)?;
            let mut seen = HashSet::new();
            df.retain_rows(|row| {
                let key = indices
                    .iter()
                    .map(|&i| row[i].dedup_key())
                    .collect::<Vec<_>>()
                    .join("\u{1f}");
                seen.insert(key)
            });
            Ok(())
        }
        CleaningOp::CastColumn { column, dtype } => {
            let index = resolve_column(df, column, op)?;
            for row in df.rows_mut() {
                row[index] = cast_value(&row[index], *dtype);
            }
            Ok(())
        }
        CleaningOp::TrimWhitespace { columns } => {
            let indices = resolve_columns(df, columns.as_deref(), op)?;
            for row in df.rows_mut() {
                for &i in &indices {
                    if let Value::Str(s) = &row[i] {
                        let trimmed = s.trim();
                        if trimmed.len() != s.len() {
                            row[i] = Value::Str(trimmed.to_string());
                        }
                    }
                }
            }
            Ok(())
        }
        CleaningOp::ReplaceValues { column, from, to } => {
            let index = resolve_column(df, column, op)?;
            let needle = Value::from_json(from);
            let replacement = Value::from_json(to);
            for row in df.rows_mut() {
                if values_equal(&row[index], &needle) {
                    row[index] = replacement.clone();
                }
            }
            Ok(())
        }
        CleaningOp::FilterRows {
            column,
            comparison,
            value,
        } => {
            let index = resolve_column(df, column, op)?;
            match comparison {
                Comparison::IsNull => {
                    df.retain_rows(|row| row[index].is_null());
                    Ok(())
                }
                Comparison::NotNull => {
                    df.retain_rows(|row| !row[index].is_null());
                    Ok(())
                }
                Comparison::Eq | Comparison::Ne => {
                    let target = Value::from_json(value);
                    let keep_equal = *comparison == Comparison::Eq;
                    df.retain_rows(|row| values_equal(&row[index], &target) == keep_equal);
                    Ok(())
                }
                Comparison::Gt | Comparison::Ge | Comparison::Lt | Comparison::Le => {
                    let target = Value::from_json(value).as_f64().ok_or_else(|| {
                        CleanError::OpFailed {
                            op: op.describe(),
                            reason: format!("comparison value {} is not numeric", value),
                        }
                    })?;
                    let cmp = *comparison;
                    df.retain_rows(|row| match row[index].as_f64() {
                        Some(cell) => match cmp {
                            Comparison::Gt => cell > target,
                            Comparison::Ge => cell >= target,
                            Comparison::Lt => cell < target,
                            Comparison::Le => cell <= target,
                            _ => unreachable!(),
                        },
                        // Non-numeric cells never satisfy a numeric comparison
                        None => false,
                    });
                    Ok(())
                }
            }
        }
    }
}

/// Equality with Int/Float coercion so `1` matches `1.0`
fn values_equal(a: &Value, b: &Value) -> bool {
    if let (Some(x), Some(y)) = (a.as_f64(), b.as_f64()) {
        return x == y;
    }
    a == b
}

fn cast_value(value: &Value, dtype: CastDType) -> Value {
    match dtype {
        CastDType::Int => match value {
            Value::Int(i) => Value::Int(*i),
            Value::Float(f) if f.is_finite() => Value::Int(*f as i64),
            Value::Bool(b) => Value::Int(i64::from(*b)),
            Value::Str(s) => match s.trim().parse::<i64>() {
                Ok(i) => Value::Int(i),
                Err(_) => s
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(|f| Value::Int(f as i64))
                    .unwrap_or(Value::Null),
            },
            _ => Value::Null,
        },
        CastDType::Float => match value {
            Value::Int(i) => Value::Float(*i as f64),
            Value::Float(f) => Value::Float(*f),
            Value::Bool(b) => Value::Float(if *b { 1.0 } else { 0.0 }),
            Value::Str(s) => s
                .trim()
                .parse::<f64>()
                .map(Value::Float)
                .unwrap_or(Value::Null),
            Value::Null => Value::Null,
        },
        CastDType::Bool => match value {
            Value::Bool(b) => Value::Bool(*b),
            Value::Int(0) => Value::Bool(false),
            Value::Int(1) => Value::Bool(true),
            Value::Str(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                _ => Value::Null,
            },
            _ => Value::Null,
        },
        CastDType::String => match value {
            Value::Null => Value::Null,
            other => Value::Str(other.to_csv_field()),
        },
    }
}

fn resolve_column(df: &DataFrame, name: &str, op: &CleaningOp) -> Result<usize, CleanError> {
    df.column_index(name).ok_or_else(|| CleanError::UnknownColumn {
        op: op.describe(),
        column: name.to_string(),
    })
}

/// Resolve an optional column list; `None` means every column.
fn resolve_columns(
    df: &DataFrame,
    columns: Option<&[String]>,
    op: &CleaningOp,
) -> Result<Vec<usize>, CleanError> {
    match columns {
        None => Ok((0..df.n_cols()).collect()),
        Some(names) => names
            .iter()
            .map(|name| resolve_column(df, name, op))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleaner::plan::PLAN_VERSION;

    fn sample() -> DataFrame {
        DataFrame::new(
            vec!["name".to_string(), "age".to_string(), "city".to_string()],
            vec![
                vec![
                    Value::Str(" ada ".to_string()),
                    Value::Int(36),
                    Value::Str("london".to_string()),
                ],
                vec![
                    Value::Str("grace".to_string()),
                    Value::Null,
                    Value::Str("dc".to_string()),
                ],
                vec![
                    Value::Str("alan".to_string()),
                    Value::Int(41),
                    Value::Null,
                ],
                vec![
                    Value::Str("alan".to_string()),
                    Value::Int(41),
                    Value::Null,
                ],
            ],
        )
        .unwrap()
    }

    fn plan(operations: Vec<CleaningOp>) -> CleaningPlan {
        CleaningPlan {
            version: PLAN_VERSION.to_string(),
            operations,
        }
    }

    #[test]
    fn test_drop_nulls_all_columns() {
        let (cleaned, report) =
            apply_plan(&sample(), &plan(vec![CleaningOp::DropNulls { columns: None }])).unwrap();
        assert_eq!(cleaned.n_rows(), 1);
        assert_eq!(report.rows_before, 4);
        assert_eq!(report.rows_after, 1);
    }

    #[test]
    fn test_drop_nulls_single_column() {
        let op = CleaningOp::DropNulls {
            columns: Some(vec!["age".to_string()]),
        };
        let (cleaned, _) = apply_plan(&sample(), &plan(vec![op])).unwrap();
        assert_eq!(cleaned.n_rows(), 3);
    }

    #[test]
    fn test_fill_nulls() {
        let op = CleaningOp::FillNulls {
            column: "age".to_string(),
            value: serde_json::json!(0),
        };
        let (cleaned, _) = apply_plan(&sample(), &plan(vec![op])).unwrap();
        assert_eq!(cleaned.rows()[1][1], Value::Int(0));
    }

    #[test]
    fn test_drop_duplicates_keeps_first() {
        let op = CleaningOp::DropDuplicates { columns: None };
        let (cleaned, _) = apply_plan(&sample(), &plan(vec![op])).unwrap();
        assert_eq!(cleaned.n_rows(), 3);
    }

    #[test]
    fn test_rename_and_trim_chain() {
        let ops = vec![
            CleaningOp::TrimWhitespace {
                columns: Some(vec!["name".to_string()]),
            },
            CleaningOp::RenameColumn {
                from: "name".to_string(),
                to: "person".to_string(),
            },
        ];
        let (cleaned, report) = apply_plan(&sample(), &plan(ops)).unwrap();
        assert_eq!(report.operations_applied, 2);
        assert_eq!(cleaned.columns()[0], "person");
        assert_eq!(cleaned.rows()[0][0], Value::Str("ada".to_string()));
    }

    #[test]
    fn test_rename_to_existing_column_fails() {
        let op = CleaningOp::RenameColumn {
            from: "name".to_string(),
            to: "age".to_string(),
        };
        let err = apply_plan(&sample(), &plan(vec![op])).unwrap_err();
        assert!(matches!(err, CleanError::OpFailed { .. }));
    }

    #[test]
    fn test_unknown_column_names_the_op() {
        let op = CleaningOp::FillNulls {
            column: "salary".to_string(),
            value: serde_json::json!(0),
        };
        let err = apply_plan(&sample(), &plan(vec![op])).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("salary"));
        assert!(message.contains("fill_nulls"));
    }

    #[test]
    fn test_filter_rows_numeric() {
        let op = CleaningOp::FilterRows {
            column: "age".to_string(),
            comparison: Comparison::Ge,
            value: serde_json::json!(40),
        };
        let (cleaned, _) = apply_plan(&sample(), &plan(vec![op])).unwrap();
        // The null-age row drops out too: non-numeric cells never match
        assert_eq!(cleaned.n_rows(), 2);
        assert_eq!(cleaned.rows()[0][1], Value::Int(41));
    }

    #[test]
    fn test_filter_rows_non_numeric_target_fails() {
        let op = CleaningOp::FilterRows {
            column: "age".to_string(),
            comparison: Comparison::Gt,
            value: serde_json::json!("forty"),
        };
        assert!(apply_plan(&sample(), &plan(vec![op])).is_err());
    }

    #[test]
    fn test_cast_column_string_to_int() {
        let df = DataFrame::new(
            vec!["v".to_string()],
            vec![
                vec![Value::Str("12".to_string())],
                vec![Value::Str("3.7".to_string())],
                vec![Value::Str("oops".to_string())],
                vec![Value::Bool(true)],
            ],
        )
        .unwrap();
        let op = CleaningOp::CastColumn {
            column: "v".to_string(),
            dtype: CastDType::Int,
        };
        let (cleaned, _) = apply_plan(&df, &plan(vec![op])).unwrap();
        assert_eq!(cleaned.rows()[0][0], Value::Int(12));
        assert_eq!(cleaned.rows()[1][0], Value::Int(3));
        assert_eq!(cleaned.rows()[2][0], Value::Null);
        assert_eq!(cleaned.rows()[3][0], Value::Int(1));
    }

    #[test]
    fn test_replace_values_numeric_coercion() {
        let df = DataFrame::new(
            vec!["v".to_string()],
            vec![vec![Value::Float(1.0)], vec![Value::Int(2)]],
        )
        .unwrap();
        let op = CleaningOp::ReplaceValues {
            column: "v".to_string(),
            from: serde_json::json!(1),
            to: serde_json::json!(100),
        };
        let (cleaned, _) = apply_plan(&df, &plan(vec![op])).unwrap();
        assert_eq!(cleaned.rows()[0][0], Value::Int(100));
        assert_eq!(cleaned.rows()[1][0], Value::Int(2));
    }

    #[test]
    fn test_drop_all_columns_rejected() {
        let op = CleaningOp::DropColumns {
            columns: vec!["name".to_string(), "age".to_string(), "city".to_string()],
        };
        assert!(apply_plan(&sample(), &plan(vec![op])).is_err());
    }

    #[test]
    fn test_failed_plan_leaves_input_untouched() {
        let df = sample();
        let ops = vec![
            CleaningOp::DropNulls { columns: None },
            CleaningOp::FillNulls {
                column: "missing".to_string(),
                value: serde_json::json!(0),
            },
        ];
        let result = apply_plan(&df, &plan(ops));
        assert!(result.is_err());
        assert_eq!(df.n_rows(), 4);
    }
}
