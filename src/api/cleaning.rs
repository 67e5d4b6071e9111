//! Cleaning API handler
//!
//! `POST /clean-data`: instruction in, LLM-generated plan out, executed
//! against the session table. The response echoes the applied plan so
//! clients can show what was done.

use crate::api::SharedState;
use crate::cleaner::{self, CleaningPlan};
use crate::error::AppError;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

/// Request body for `POST /clean-data`
#[derive(Debug, Deserialize)]
pub struct CleanDataRequest {
    /// Session holding the table to clean
    pub session_id: String,
    /// Natural-language cleaning instruction
    pub instruction: String,
}

/// Response for `POST /clean-data`
#[derive(Debug, Serialize)]
pub struct CleanDataResponse {
    /// Human-readable status
    pub message: String,
    /// The plan the LLM generated and the executor applied
    pub plan: CleaningPlan,
    /// Row count before cleaning
    pub rows_before: usize,
    /// Row count after cleaning
    pub rows_after: usize,
    /// First rows of the cleaned table
    pub preview: Vec<Value>,
}

/// Longest accepted instruction, in characters
const MAX_INSTRUCTION_LENGTH: usize = 4000;

/// POST /clean-data - Apply a natural-language cleaning instruction
///
/// # Flow
/// 1. Look up the session table
/// 2. Ask the LLM for a JSON cleaning plan over the table's schema
/// 3. Validate and execute the plan on a working copy
/// 4. Store the cleaned table back into the session
///
/// On any failure the session table is left unchanged.
pub async fn clean_data(
    State(state): State<SharedState>,
    Json(request): Json<CleanDataRequest>,
) -> Result<Json<CleanDataResponse>, AppError> {
    if request.instruction.trim().is_empty() {
        return Err(AppError::InvalidRequest(
            "instruction must not be empty".to_string(),
        ));
    }
    if request.instruction.len() > MAX_INSTRUCTION_LENGTH {
        return Err(AppError::InvalidRequest(format!(
            "instruction too long ({} > {} characters)",
            request.instruction.len(),
            MAX_INSTRUCTION_LENGTH
        )));
    }

    // Snapshot the table and client, then release the lock for the LLM call
    let (df, http_client, cleaner_config) = {
        let state = state.read().await;
        let df = state
            .session(&request.session_id)
            .ok_or_else(|| AppError::SessionNotFound(request.session_id.clone()))?;
        (df, state.http_client.clone(), state.config.cleaner.clone())
    };

    let plan =
        cleaner::generate_plan(&http_client, &cleaner_config, &df, &request.instruction).await?;

    let (cleaned, report) = cleaner::apply_plan(&df, &plan)?;
    let preview = cleaned.head_records(5);

    {
        let mut state = state.write().await;
        if !state.replace_session(&request.session_id, cleaned) {
            return Err(AppError::SessionNotFound(request.session_id.clone()));
        }
    }

    info!(
        session_id = %request.session_id,
        operations = report.operations_applied,
        rows_before = report.rows_before,
        rows_after = report.rows_after,
        "Cleaning applied"
    );

    Ok(Json(CleanDataResponse {
        message: "Cleaning applied".to_string(),
        plan,
        rows_before: report.rows_before,
        rows_after: report.rows_after,
        preview,
    }))
}
