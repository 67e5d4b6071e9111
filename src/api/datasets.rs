//! Dataset API handlers
//!
//! Fetching files back out of the hub and snapshotting cleaned sessions
//! into it.

use crate::api::SharedState;
use crate::error::AppError;
use crate::hub::HubClient;
use crate::table::{read_table, to_csv_bytes, FileFormat};
use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

/// Query for `GET /get-file`
#[derive(Debug, Deserialize)]
pub struct GetFileQuery {
    /// Filename (without extension) under the repo's uploads/ prefix
    pub filename: String,
}

/// Response for `GET /get-file`
#[derive(Debug, Serialize)]
pub struct GetFileResponse {
    /// Echoed filename
    pub filename: String,
    /// First rows of the stored CSV as JSON records
    pub records: Vec<Value>,
}

/// Request body for `POST /save-cleaned-file`
#[derive(Debug, Deserialize)]
pub struct SaveCleanedRequest {
    /// Session whose table should be snapshotted
    pub session_id: String,
}

/// Response for `POST /save-cleaned-file`
#[derive(Debug, Serialize)]
pub struct SaveCleanedResponse {
    /// Human-readable status
    pub message: String,
    /// Path of the snapshot inside the repository
    pub path_in_repo: String,
}

/// Rows returned by `GET /get-file`
const GET_FILE_PREVIEW_ROWS: usize = 50;

/// GET /get-file - Fetch a stored dataset and return its first rows
///
/// Downloads `uploads/{filename}.csv` from the dataset repository, parses it,
/// and returns up to 50 rows as JSON records. Non-finite floats come back as
/// null so the payload stays valid JSON.
pub async fn get_file(
    State(state): State<SharedState>,
    Query(query): Query<GetFileQuery>,
) -> Result<Json<GetFileResponse>, AppError> {
    let (http_client, hub_config) = {
        let state = state.read().await;
        (state.http_client.clone(), state.config.hub.clone())
    };
    let hub = HubClient::new(http_client, &hub_config);

    let path_in_repo = format!("uploads/{}.csv", query.filename);
    let bytes = hub.download_file(&path_in_repo).await?;
    let df = read_table(FileFormat::Csv, &bytes)?;

    info!(
        filename = %query.filename,
        rows = df.n_rows(),
        "Fetched dataset from hub"
    );

    Ok(Json(GetFileResponse {
        filename: query.filename,
        records: df.head_records(GET_FILE_PREVIEW_ROWS),
    }))
}

/// POST /save-cleaned-file - Persist a session's table to the hub
///
/// Serializes the session table to CSV and commits it to the dataset
/// repository as `cleaned/{session_id}_cleaned.csv`.
pub async fn save_cleaned_file(
    State(state): State<SharedState>,
    Json(request): Json<SaveCleanedRequest>,
) -> Result<Json<SaveCleanedResponse>, AppError> {
    let (df, http_client, hub_config) = {
        let state = state.read().await;
        let df = state
            .session(&request.session_id)
            .ok_or_else(|| AppError::SessionNotFound(request.session_id.clone()))?;
        (df, state.http_client.clone(), state.config.hub.clone())
    };

    let csv_bytes = to_csv_bytes(&df)?;
    let hub = HubClient::new(http_client, &hub_config);
    hub.ensure_repo().await?;

    let path_in_repo = format!("cleaned/{}_cleaned.csv", request.session_id);
    hub.upload_file(
        &path_in_repo,
        &csv_bytes,
        &format!("Save cleaned session {}", request.session_id),
    )
    .await?;

    info!(
        session_id = %request.session_id,
        path = %path_in_repo,
        rows = df.n_rows(),
        "Saved cleaned session to hub"
    );

    Ok(Json(SaveCleanedResponse {
        message: "File saved successfully".to_string(),
        path_in_repo,
    }))
}
