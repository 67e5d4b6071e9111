//! Upload API handlers
//!
//! Two upload paths: `/upload` parses a CSV into an in-memory cleaning
//! session, `/upload-file` converts any supported format to CSV and
//! persists it to the dataset hub.

use crate::api::{SharedState, MAX_UPLOAD_BYTES};
use crate::error::AppError;
use crate::hub::HubClient;
use crate::table::{read_table, to_csv_bytes, FileFormat};
use axum::extract::{Multipart, State};
use axum::Json;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

/// Response for `POST /upload`
#[derive(Debug, Serialize)]
pub struct UploadSessionResponse {
    /// Human-readable status
    pub message: String,
    /// Session id for follow-up cleaning calls
    pub session_id: String,
    /// First rows of the parsed table
    pub preview: Vec<Value>,
}

/// Response for `POST /upload-file`
#[derive(Debug, Serialize)]
pub struct UploadFileResponse {
    /// Human-readable status
    pub message: String,
    /// Repository the file landed in
    pub repo: String,
    /// Path of the converted CSV inside the repository
    pub path_in_repo: String,
    /// Commit URL reported by the hub, when available
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit_url: Option<String>,
}

/// One uploaded file from a multipart form
pub(crate) struct UploadedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Pull the `file` field out of a multipart form, enforcing the size cap
pub(crate) async fn read_file_field(
    multipart: &mut Multipart,
) -> Result<Option<UploadedFile>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidRequest(format!("failed to read multipart field: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or("upload.csv").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::InvalidRequest(format!("failed to read file data: {}", e)))?;
        if bytes.len() > MAX_UPLOAD_BYTES {
            return Err(AppError::InvalidRequest(format!(
                "file too large ({} bytes, limit {})",
                bytes.len(),
                MAX_UPLOAD_BYTES
            )));
        }
        return Ok(Some(UploadedFile {
            filename,
            bytes: bytes.to_vec(),
        }));
    }
    Ok(None)
}

/// POST /upload - Parse a CSV into a new in-memory cleaning session
///
/// # Returns
/// * `Ok(Json)` - Session id plus a preview of the first rows
/// * `Err(AppError)` - If the form has no file or the CSV does not parse
pub async fn upload_session(
    State(state): State<SharedState>,
    mut multipart: Multipart,
) -> Result<Json<UploadSessionResponse>, AppError> {
    let file = read_file_field(&mut multipart)
        .await?
        .ok_or_else(|| AppError::InvalidRequest("missing 'file' field".to_string()))?;

    let df = read_table(FileFormat::Csv, &file.bytes)?;
    let preview = df.head_records(5);

    let session_id = {
        let mut state = state.write().await;
        state.insert_session(df)
    };

    info!(
        session_id = %session_id,
        filename = %file.filename,
        "Created cleaning session"
    );

    Ok(Json(UploadSessionResponse {
        message: "File uploaded successfully".to_string(),
        session_id,
        preview,
    }))
}

/// POST /upload-file - Convert an upload to CSV and persist it to the hub
///
/// Accepts any supported format, converts it to CSV, and commits it to the
/// dataset repository under `uploads/{stem}.csv`. The repository is created
/// on first use.
pub async fn upload_file(
    State(state): State<SharedState>,
    mut multipart: Multipart,
) -> Result<Json<UploadFileResponse>, AppError> {
    let file = read_file_field(&mut multipart)
        .await?
        .ok_or_else(|| AppError::InvalidRequest("missing 'file' field".to_string()))?;

    let format = FileFormat::from_filename(&file.filename).ok_or_else(|| {
        let suffix = file
            .filename
            .rsplit_once('.')
            .map(|(_, ext)| format!(".{}", ext))
            .unwrap_or_else(|| file.filename.clone());
        AppError::UnsupportedFormat(suffix)
    })?;

    let df = read_table(format, &file.bytes)?;
    let csv_bytes = to_csv_bytes(&df)?;

    // Snapshot what we need and release the lock before any network I/O
    let (http_client, hub_config) = {
        let state = state.read().await;
        (state.http_client.clone(), state.config.hub.clone())
    };
    let hub = HubClient::new(http_client, &hub_config);

    hub.ensure_repo().await?;

    let stem = file
        .filename
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(&file.filename);
    let path_in_repo = format!("uploads/{}.csv", stem);
    let commit = hub
        .upload_file(
            &path_in_repo,
            &csv_bytes,
            &format!("Upload {}", file.filename),
        )
        .await?;

    info!(
        filename = %file.filename,
        path = %path_in_repo,
        rows = df.n_rows(),
        "Uploaded dataset to hub"
    );

    Ok(Json(UploadFileResponse {
        message: "File uploaded successfully".to_string(),
        repo: hub.repo_id().to_string(),
        path_in_repo,
        commit_url: commit.commit_url,
    }))
}
