//! Cleaning prompt construction
//!
//! Builds the meta-prompt that asks the LLM to translate a natural-language
//! cleaning instruction into a JSON plan over the closed operation
//! vocabulary understood by the executor.

use crate::table::DataFrame;
use std::fmt::Write;

/// System message for plan generation
pub const SYSTEM_PROMPT: &str =
    "You are a data cleaning assistant. You translate cleaning instructions into JSON cleaning plans.";

/// Build the plan-generation prompt for a table and instruction.
///
/// The prompt describes the table schema (column names and dominant types),
/// the operation vocabulary with parameter shapes, and a worked example, then
/// asks for JSON only.
pub fn build_cleaning_prompt(df: &DataFrame, instruction: &str) -> String {
    let mut schema = String::new();
    for (i, name) in df.columns().iter().enumerate() {
        let _ = writeln!(schema, "- \"{}\" ({})", name, df.column_dtype(i));
    }

    format!(
        r#"You are given a table with {rows} rows and these columns:
{schema}
Translate the user's cleaning INSTRUCTION into a JSON plan.

Output Format (JSON):
{{
  "version": "1.0",
  "operations": [
    {{"op": "...", ...parameters...}}
  ]
}}

Available operations:
1. drop_nulls: Drop rows with missing values. Parameters: {{"columns": ["a", "b"]}} (optional; omit to check every column)
2. fill_nulls: Replace missing values with a constant. Parameters: {{"column": "a", "value": 0}}
3. drop_columns: Remove columns. Parameters: {{"columns": ["a"]}}
4. rename_column: Rename one column. Parameters: {{"from": "a", "to": "b"}}
5. drop_duplicates: Drop duplicate rows, keeping the first. Parameters: {{"columns": ["a"]}} (optional; omit to compare whole rows)
6. cast_column: Convert a column's type. Parameters: {{"column": "a", "dtype": "int"}} where dtype is one of "int", "float", "bool", "string"
7. trim_whitespace: Strip whitespace from text cells. Parameters: {{"columns": ["a"]}} (optional)
8. replace_values: Replace exact values. Parameters: {{"column": "a", "from": "N/A", "to": null}}
9. filter_rows: Keep only matching rows. Parameters: {{"column": "a", "comparison": "ge", "value": 18}} where comparison is one of "eq", "ne", "gt", "ge", "lt", "le", "is_null", "not_null"

Important Rules:
- Use ONLY the operations listed above, with exactly the parameter names shown
- Reference ONLY columns that exist in the table
- Operations run in order; later operations see earlier results
- "value" for gt/ge/lt/le comparisons must be a number
- Return ONLY valid JSON, no other text

Example:

Instruction: "remove rows without an age, then keep adults only"
{{
  "version": "1.0",
  "operations": [
    {{"op": "drop_nulls", "columns": ["age"]}},
    {{"op": "filter_rows", "column": "age", "comparison": "ge", "value": 18}}
  ]
}}

INSTRUCTION: "{instruction}"

Generate the JSON plan."#,
        rows = df.n_rows(),
        schema = schema,
        instruction = instruction,
    )
}
