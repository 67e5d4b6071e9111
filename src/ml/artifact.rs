//! Model artifacts
//!
//! The serialized form of a training run that gets persisted to the dataset
//! hub and served back by `GET /download-model`.

use crate::ml::{ProblemType, TrainError, TrainedEstimator};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Everything needed to reload and audit a fitted model
#[derive(Debug, Serialize, Deserialize)]
pub struct ModelArtifact {
    /// Roster name of the model
    pub model_name: String,
    /// Problem family
    pub problem_type: ProblemType,
    /// Feature columns in matrix order
    pub feature_columns: Vec<String>,
    /// Target column; absent for clustering
    pub target_column: Option<String>,
    /// Class labels in encoding order; empty outside classification
    pub classes: Vec<String>,
    /// Hyperparameters the run resolved to
    pub hyperparameters: serde_json::Value,
    /// Evaluation metrics
    pub metrics: BTreeMap<String, f64>,
    /// When the model was trained
    pub trained_at: DateTime<Utc>,
    /// The fitted estimator
    pub estimator: TrainedEstimator,
}

impl ModelArtifact {
    /// Serialize the artifact for upload
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, TrainError> {
        serde_json::to_vec(self).map_err(|e| TrainError::Serialize(e.to_string()))
    }

    /// Deserialize an artifact downloaded from the hub
    #[allow(dead_code)] // Used by clients reloading artifacts, and in tests
    pub fn from_json_bytes(bytes: &[u8]) -> Result<ModelArtifact, TrainError> {
        serde_json::from_slice(bytes).map_err(|e| TrainError::Serialize(e.to_string()))
    }
}

/// Hub path for a model artifact: `models/{session}_{model}_{timestamp}.json`
pub fn artifact_path(session_id: &str, model_name: &str, trained_at: &DateTime<Utc>) -> String {
    format!(
        "models/{}_{}_{}.json",
        session_id,
        model_name,
        trained_at.format("%Y%m%d%H%M%S")
    )
}
