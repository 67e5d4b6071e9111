//! Cleaner module
//!
//! Turns natural-language cleaning instructions into executed table
//! transformations: prompt the LLM for a JSON plan, parse and validate it,
//! then interpret it against the session table.

pub mod api_client;
pub mod executor;
pub mod openai_types;
pub mod plan;
pub mod prompts;

pub use executor::{apply_plan, CleanError, CleanReport};
pub use plan::{CleaningOp, CleaningPlan};

use crate::config::CleanerConfig;
use crate::error::AppError;
use crate::table::DataFrame;

/// Generate a cleaning plan for a table from a natural-language instruction
///
/// Sends the plan-generation prompt with JSON mode enabled, parses the
/// response into a [`CleaningPlan`], and validates it. One retry is attempted
/// when the model returns an unparsable or invalid plan.
///
/// # Arguments
/// * `client` - Shared HTTP client
/// * `config` - Cleaner configuration
/// * `df` - The table the instruction applies to (schema goes into the prompt)
/// * `instruction` - The user's cleaning instruction
///
/// # Returns
/// * `Ok(CleaningPlan)` - A validated plan
/// * `Err(AppError)` - If the API call fails twice or both plans are invalid
pub async fn generate_plan(
    client: &reqwest::Client,
    config: &CleanerConfig,
    df: &DataFrame,
    instruction: &str,
) -> Result<CleaningPlan, AppError> {
    let prompt = prompts::build_cleaning_prompt(df, instruction);

    tracing::debug!(
        instruction_len = instruction.len(),
        columns = df.n_cols(),
        "Requesting cleaning plan"
    );

    match try_plan_once(client, config, &prompt).await {
        Ok(plan) => {
            tracing::debug!(
                num_operations = plan.operations.len(),
                "Generated valid cleaning plan"
            );
            Ok(plan)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Plan generation failed, retrying once");
            let plan = try_plan_once(client, config, &prompt).await?;
            tracing::debug!(
                num_operations = plan.operations.len(),
                "Plan generation succeeded on retry"
            );
            Ok(plan)
        }
    }
}

/// Attempt to generate a plan once
async fn try_plan_once(
    client: &reqwest::Client,
    config: &CleanerConfig,
    prompt: &str,
) -> Result<CleaningPlan, AppError> {
    let response = api_client::call_chat_api(client, config, prompts::SYSTEM_PROMPT, prompt, true).await?;
    let stripped = strip_code_fences(&response);

    let plan: CleaningPlan = serde_json::from_str(stripped).map_err(|e| {
        AppError::InvalidPlan(format!(
            "Failed to parse plan response as JSON: {} - Response: {}",
            e, response
        ))
    })?;

    plan.validate().map_err(AppError::InvalidPlan)?;

    Ok(plan)
}

/// Strip a surrounding Markdown code fence from a model response.
///
/// Models sometimes wrap JSON in ``` fences despite being told not to.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop an optional language tag on the fence line
    let rest = match rest.split_once('\n') {
        Some((_lang, body)) => body,
        None => rest,
    };
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
