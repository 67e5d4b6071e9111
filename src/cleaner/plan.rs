//! Cleaning plan types
//!
//! A cleaning plan is the structured contract between the LLM and the
//! executor: a version tag plus an ordered list of operations drawn from a
//! closed vocabulary. Plans are parsed from the model's JSON output and
//! validated before anything touches a session table.

use serde::{Deserialize, Serialize};

/// Supported plan version
pub const PLAN_VERSION: &str = "1.0";

/// A validated sequence of cleaning operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleaningPlan {
    /// Plan format version
    #[serde(default = "default_version")]
    pub version: String,
    /// Operations applied in order
    pub operations: Vec<CleaningOp>,
}

fn default_version() -> String {
    PLAN_VERSION.to_string()
}

/// Target type for `cast_column`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CastDType {
    /// 64-bit integer
    Int,
    /// 64-bit float
    Float,
    /// Boolean
    Bool,
    /// UTF-8 string
    String,
}

/// Row-filter comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    /// Equal
    Eq,
    /// Not equal
    Ne,
    /// Greater than (numeric)
    Gt,
    /// Greater than or equal (numeric)
    Ge,
    /// Less than (numeric)
    Lt,
    /// Less than or equal (numeric)
    Le,
    /// Cell is missing
    IsNull,
    /// Cell is present
    NotNull,
}

/// A single cleaning operation
///
/// The `op` tag selects the variant; the remaining fields are the operation's
/// parameters. Optional `columns` lists default to "all columns".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum CleaningOp {
    /// Drop rows that have nulls in the listed columns (or in any column)
    DropNulls {
        /// Columns to inspect; all columns when absent
        #[serde(default)]
        columns: Option<Vec<String>>,
    },
    /// Replace nulls in a column with a constant
    FillNulls {
        /// Target column
        column: String,
        /// Replacement value
        value: serde_json::Value,
    },
    /// Remove the listed columns
    DropColumns {
        /// Columns to remove
        columns: Vec<String>,
    },
    /// Rename a column
    RenameColumn {
        /// Existing column name
        from: String,
        /// New column name
        to: String,
    },
    /// Drop duplicate rows, keeping the first occurrence
    DropDuplicates {
        /// Columns that define duplication; all columns when absent
        #[serde(default)]
        columns: Option<Vec<String>>,
    },
    /// Convert a column to a target type; uncastable cells become null
    CastColumn {
        /// Target column
        column: String,
        /// Target type
        dtype: CastDType,
    },
    /// Strip leading/trailing whitespace from string cells
    TrimWhitespace {
        /// Columns to trim; all columns when absent
        #[serde(default)]
        columns: Option<Vec<String>>,
    },
    /// Replace exact cell values in a column
    ReplaceValues {
        /// Target column
        column: String,
        /// Value to replace
        from: serde_json::Value,
        /// Replacement value
        to: serde_json::Value,
    },
    /// Keep only rows where the comparison holds
    FilterRows {
        /// Column the comparison reads
        column: String,
        /// Comparison operator
        comparison: Comparison,
        /// Right-hand value; ignored for is_null / not_null
        #[serde(default)]
        value: serde_json::Value,
    },
}

impl CleaningOp {
    /// Short human-readable description, used in logs and error messages
    pub fn describe(&self) -> String {
        match self {
            CleaningOp::DropNulls { columns } => describe_with_columns("drop_nulls", columns),
            CleaningOp::FillNulls { column, value } => {
                format!("fill_nulls({} <- {})", column, value)
            }
            CleaningOp::DropColumns { columns } => {
                format!("drop_columns({})", columns.join(", "))
            }
            CleaningOp::RenameColumn { from, to } => format!("rename_column({} -> {})", from, to),
            CleaningOp::DropDuplicates { columns } => {
                describe_with_columns("drop_duplicates", columns)
            }
            CleaningOp::CastColumn { column, dtype } => {
                format!("cast_column({} as {:?})", column, dtype)
            }
            CleaningOp::TrimWhitespace { columns } => {
                describe_with_columns("trim_whitespace", columns)
            }
            CleaningOp::ReplaceValues { column, from, to } => {
                format!("replace_values({}: {} -> {})", column, from, to)
            }
            CleaningOp::FilterRows {
                column, comparison, ..
            } => format!("filter_rows({} {:?})", column, comparison),
        }
    }
}

fn describe_with_columns(name: &str, columns: &Option<Vec<String>>) -> String {
    match columns {
        Some(cols) => format!("{}({})", name, cols.join(", ")),
        None => format!("{}(*)", name),
    }
}

impl CleaningPlan {
    /// Validate the plan structure
    ///
    /// Checks version compatibility, that the plan is non-empty, and that no
    /// operation names an empty column. Column existence is checked by the
    /// executor against the actual table.
    pub fn validate(&self) -> Result<(), String> {
        if self.version != PLAN_VERSION {
            return Err(format!(
                "unsupported plan version '{}' (expected '{}')",
                self.version, PLAN_VERSION
            ));
        }
        if self.operations.is_empty() {
            return Err("plan contains no operations".to_string());
        }
        for op in &self.operations {
            op_column_names(op, |name| {
                if name.trim().is_empty() {
                    Err(format!("operation {} names an empty column", op.describe()))
                } else {
                    Ok(())
                }
            })?;
            if let CleaningOp::DropColumns { columns } = op {
                if columns.is_empty() {
                    return Err("drop_columns lists no columns".to_string());
                }
            }
        }
        Ok(())
    }
}

fn op_column_names<F: FnMut(&str) -> Result<(), String>>(
    op: &CleaningOp,
    mut check: F,
) -> Result<(), String> {
    let optional = |cols: &Option<Vec<String>>, check: &mut F| -> Result<(), String> {
        if let Some(cols) = cols {
            for c in cols {
                check(c)?;
            }
        }
        Ok(())
    };
    match op {
        CleaningOp::DropNulls { columns }
        | CleaningOp::DropDuplicates { columns }
        | CleaningOp::TrimWhitespace { columns } => optional(columns, &mut check),
        CleaningOp::FillNulls { column, .. }
        | CleaningOp::CastColumn { column, .. }
        | CleaningOp::ReplaceValues { column, .. }
        | CleaningOp::FilterRows { column, .. } => check(column),
        CleaningOp::DropColumns { columns } => {
            for c in columns {
                check(c)?;
            }
            Ok(())
        }
        CleaningOp::RenameColumn { from, to } => {
            check(from)?;
            check(to)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plan_from_json() {
        let json = r#"{
            "version": "1.0",
            "operations": [
                {"op": "drop_nulls"},
                {"op": "rename_column", "from": "Age", "to": "age"},
                {"op": "filter_rows", "column": "age", "comparison": "ge", "value": 18},
                {"op": "cast_column", "column": "age", "dtype": "int"}
            ]
        }"#;
        let plan: CleaningPlan = serde_json::from_str(json).unwrap();
        assert_eq!(plan.operations.len(), 4);
        assert!(plan.validate().is_ok());
        assert_eq!(
            plan.operations[2],
            CleaningOp::FilterRows {
                column: "age".to_string(),
                comparison: Comparison::Ge,
                value: serde_json::json!(18),
            }
        );
    }

    #[test]
    fn test_version_defaults_when_absent() {
        let json = r#"{"operations": [{"op": "drop_nulls"}]}"#;
        let plan: CleaningPlan = serde_json::from_str(json).unwrap();
        assert_eq!(plan.version, PLAN_VERSION);
        assert!(plan.validate().is_ok());
    }

    #[test]
    fn test_empty_plan_rejected() {
        let plan = CleaningPlan {
            version: PLAN_VERSION.to_string(),
            operations: vec![],
        };
        assert!(plan.validate().is_err());
    }

    #[test]
    fn test_unknown_version_rejected() {
        let plan = CleaningPlan {
            version: "2.0".to_string(),
            operations: vec![CleaningOp::DropNulls { columns: None }],
        };
        let err = plan.validate().unwrap_err();
        assert!(err.contains("2.0"));
    }

    #[test]
    fn test_empty_column_name_rejected() {
        let plan = CleaningPlan {
            version: PLAN_VERSION.to_string(),
            operations: vec![CleaningOp::FillNulls {
                column: "  ".to_string(),
                value: serde_json::json!(0),
            }],
        };
        assert!(plan.validate().is_err());
    }

    #[test]
    fn test_unknown_op_fails_parse() {
        let json = r#"{"operations": [{"op": "summon_demons", "column": "x"}]}"#;
        let result: Result<CleaningPlan, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }

    #[test]
    fn test_describe_mentions_columns() {
        let op = CleaningOp::RenameColumn {
            from: "a".to_string(),
            to: "b".to_string(),
        };
        assert_eq!(op.describe(), "rename_column(a -> b)");
    }
}
