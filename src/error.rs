//! Error types and error handling for the application
//!
//! This module defines custom error types that can be converted to HTTP responses.
//! All errors implement `IntoResponse` to provide consistent error formatting.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level error types
///
/// All errors that can occur in the application are represented by this enum.
/// Each variant implements automatic conversion to HTTP responses via `IntoResponse`.
#[derive(Error, Debug)]
pub enum AppError {
    /// Session with the given ID was not found in the registry
    #[error("Invalid session_id: {0}")]
    SessionNotFound(String),

    /// Uploaded file has an extension without a registered reader
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// Uploaded bytes could not be parsed into a table
    #[error("Invalid dataset: {0}")]
    InvalidDataset(#[from] crate::table::TableError),

    /// Request payload is malformed (missing fields, bad multipart, oversized)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The LLM returned a plan that failed parsing or validation
    #[error("Invalid cleaning plan: {0}")]
    InvalidPlan(String),

    /// A validated cleaning plan failed while executing against the table
    #[error("Cleaning failed: {0}")]
    CleaningFailed(#[from] crate::cleaner::CleanError),

    /// The requested model name is not in the roster
    #[error("Unknown model: {0}")]
    ModelNotSupported(String),

    /// Hyperparameter payload referenced an unknown key or an unparsable value
    #[error("Invalid hyperparameters: {0}")]
    InvalidHyperparameters(String),

    /// Model fitting or dataset preparation failed
    #[error("Training failed: {0}")]
    TrainingFailed(#[from] crate::ml::TrainError),

    /// The dataset hub rejected a request or was unreachable
    #[error("Hub error: {0}")]
    Hub(#[from] crate::hub::HubError),

    /// Internal server error (catch-all for unexpected errors)
    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::SessionNotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::UnsupportedFormat(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::InvalidDataset(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::InvalidPlan(_) => (StatusCode::BAD_GATEWAY, self.to_string()),
            AppError::CleaningFailed(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::ModelNotSupported(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::InvalidHyperparameters(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::TrainingFailed(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
            AppError::Hub(crate::hub::HubError::NotFound(_)) => {
                (StatusCode::NOT_FOUND, self.to_string())
            }
            AppError::Hub(_) => (StatusCode::BAD_GATEWAY, self.to_string()),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}
