//! Training API handlers
//!
//! `POST /train-model` runs the full pipeline on an uploaded CSV and
//! persists the artifact; `GET /hyperparameters` exposes the roster
//! defaults; `GET /download-model` streams an artifact back.

use crate::api::{SharedState, MAX_UPLOAD_BYTES};
use crate::error::AppError;
use crate::hub::HubClient;
use crate::ml::{artifact, train_on_frame, Hyperparameters, ModelChoice};
use crate::state::AppState;
use crate::table::{read_table, FileFormat};
use axum::body::Body;
use axum::extract::{Multipart, Query, State};
use axum::http::{header, StatusCode};
use axum::response::Response;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

/// Query for `GET /hyperparameters`
#[derive(Debug, Deserialize)]
pub struct HyperparametersQuery {
    /// Roster name of the model
    pub model_name: String,
}

/// Response for `GET /hyperparameters`
#[derive(Debug, Serialize)]
pub struct HyperparametersResponse {
    /// Echoed model name
    pub model_name: String,
    /// Default hyperparameters for the model
    pub default_hyperparameters: serde_json::Value,
}

/// Response for `POST /train-model`
#[derive(Debug, Serialize)]
pub struct TrainModelResponse {
    /// classification, regression, or clustering
    pub problem_type: String,
    /// Roster name of the trained model
    pub model_name: String,
    /// Evaluation metrics
    pub metrics: BTreeMap<String, f64>,
    /// Hub path of the persisted artifact
    pub model_path: String,
}

/// Query for `GET /download-model`
#[derive(Debug, Deserialize)]
pub struct DownloadModelQuery {
    /// Hub path of the artifact, as returned by `POST /train-model`
    pub path: String,
}

/// GET /hyperparameters - Default hyperparameters for a roster model
pub async fn hyperparameters(
    Query(query): Query<HyperparametersQuery>,
) -> Result<Json<HyperparametersResponse>, AppError> {
    let choice = ModelChoice::parse(&query.model_name)
        .ok_or_else(|| AppError::ModelNotSupported(query.model_name.clone()))?;

    Ok(Json(HyperparametersResponse {
        model_name: choice.name().to_string(),
        default_hyperparameters: choice.default_hyperparameters(),
    }))
}

/// Parsed `POST /train-model` form
struct TrainForm {
    file_bytes: Vec<u8>,
    filename: String,
    model_choice: String,
    params: Option<String>,
    session_id: Option<String>,
    target_column: Option<String>,
}

async fn read_train_form(multipart: &mut Multipart) -> Result<TrainForm, AppError> {
    let mut file_bytes = None;
    let mut filename = String::from("dataset.csv");
    let mut model_choice = None;
    let mut params = None;
    let mut session_id = None;
    let mut target_column = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidRequest(format!("failed to read multipart field: {}", e)))?
    {
        let field_name = field.name().unwrap_or("").to_string();
        match field_name.as_str() {
            "file" => {
                if let Some(name) = field.file_name() {
                    filename = name.to_string();
                }
                let data = field.bytes().await.map_err(|e| {
                    AppError::InvalidRequest(format!("failed to read file data: {}", e))
                })?;
                if data.len() > MAX_UPLOAD_BYTES {
                    return Err(AppError::InvalidRequest(format!(
                        "file too large ({} bytes, limit {})",
                        data.len(),
                        MAX_UPLOAD_BYTES
                    )));
                }
                file_bytes = Some(data.to_vec());
            }
            "model_choice" => {
                model_choice = Some(read_text_field(field).await?);
            }
            "params" => {
                let text = read_text_field(field).await?;
                if !text.trim().is_empty() {
                    params = Some(text);
                }
            }
            "session_id" => {
                let text = read_text_field(field).await?;
                if !text.trim().is_empty() {
                    session_id = Some(text);
                }
            }
            "target_column" => {
                let text = read_text_field(field).await?;
                if !text.trim().is_empty() {
                    target_column = Some(text);
                }
            }
            other => {
                tracing::warn!(field = %other, "Unknown multipart field");
            }
        }
    }

    Ok(TrainForm {
        file_bytes: file_bytes
            .ok_or_else(|| AppError::InvalidRequest("missing 'file' field".to_string()))?,
        filename,
        model_choice: model_choice
            .ok_or_else(|| AppError::InvalidRequest("missing 'model_choice' field".to_string()))?,
        params,
        session_id,
        target_column,
    })
}

async fn read_text_field(field: axum::extract::multipart::Field<'_>) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::InvalidRequest(format!("failed to read form field: {}", e)))
}

/// POST /train-model - Train a roster model on an uploaded CSV
///
/// # Flow
/// 1. Parse the form: CSV file, model choice, hyperparameter overrides
/// 2. Build the design matrix, split, fit, and compute metrics
/// 3. Serialize the artifact and commit it to the dataset hub
///
/// The artifact lands at `models/{session_id}_{model}_{timestamp}.json`; a
/// fresh id names the run when the client did not send a `session_id`.
pub async fn train_model(
    State(state): State<SharedState>,
    mut multipart: Multipart,
) -> Result<Json<TrainModelResponse>, AppError> {
    let form = read_train_form(&mut multipart).await?;

    let choice = ModelChoice::parse(&form.model_choice)
        .ok_or_else(|| AppError::ModelNotSupported(form.model_choice.clone()))?;

    let params_map = match &form.params {
        Some(text) => serde_json::from_str::<serde_json::Value>(text)
            .ok()
            .and_then(|v| v.as_object().cloned())
            .ok_or_else(|| {
                AppError::InvalidHyperparameters("'params' must be a JSON object".to_string())
            })?,
        None => serde_json::Map::new(),
    };
    let hp = Hyperparameters::resolve(choice, &params_map)
        .map_err(AppError::InvalidHyperparameters)?;

    let format = FileFormat::from_filename(&form.filename).unwrap_or(FileFormat::Csv);
    let df = read_table(format, &form.file_bytes)?;

    let (http_client, hub_config, training_config) = {
        let state = state.read().await;
        (
            state.http_client.clone(),
            state.config.hub.clone(),
            state.config.training.clone(),
        )
    };

    // Model fitting is CPU-bound; keep it off the async workers
    let target = form.target_column.clone();
    let fit_hp = hp.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        train_on_frame(&df, choice, &fit_hp, &training_config, target.as_deref())
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("training task panicked: {}", e)))??;

    let session_id = form
        .session_id
        .unwrap_or_else(AppState::generate_session_id);
    let model_path = artifact::artifact_path(
        &session_id,
        &outcome.model_name,
        &outcome.artifact.trained_at,
    );
    let artifact_bytes = outcome.artifact.to_json_bytes()?;

    let hub = HubClient::new(http_client, &hub_config);
    hub.ensure_repo().await?;
    hub.upload_file(
        &model_path,
        &artifact_bytes,
        &format!("Train {} for session {}", outcome.model_name, session_id),
    )
    .await?;

    info!(
        model = %outcome.model_name,
        problem_type = outcome.problem_type.as_str(),
        path = %model_path,
        "Model trained and persisted"
    );

    Ok(Json(TrainModelResponse {
        problem_type: outcome.problem_type.as_str().to_string(),
        model_name: outcome.model_name,
        metrics: outcome.metrics,
        model_path,
    }))
}

/// GET /download-model - Stream a persisted model artifact back
///
/// The path must be one produced by `POST /train-model` (under `models/`);
/// anything else is rejected before the hub is contacted.
pub async fn download_model(
    State(state): State<SharedState>,
    Query(query): Query<DownloadModelQuery>,
) -> Result<Response, AppError> {
    if !query.path.starts_with("models/") || query.path.contains("..") {
        return Err(AppError::InvalidRequest(format!(
            "invalid model path: {}",
            query.path
        )));
    }

    let (http_client, hub_config) = {
        let state = state.read().await;
        (state.http_client.clone(), state.config.hub.clone())
    };
    let hub = HubClient::new(http_client, &hub_config);
    let bytes = hub.download_file(&query.path).await?;

    let filename = query.path.rsplit('/').next().unwrap_or("model.json");

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/json")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        )
        .body(Body::from(bytes))
        .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to build response: {}", e)))
}
