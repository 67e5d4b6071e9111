//! ML module
//!
//! The training pipeline: model roster and hyperparameters, design-matrix
//! construction, train/test splitting, fitting, metric computation, and
//! artifact serialization.

pub mod artifact;
pub mod dataset;
pub mod estimators;
pub mod metrics;
pub mod training;

pub use artifact::ModelArtifact;
pub use estimators::{Hyperparameters, ModelChoice, ProblemType, TrainedEstimator};
pub use training::{train_on_frame, TrainOutcome};

use thiserror::Error;

/// Errors raised while preparing data or fitting models
#[derive(Error, Debug)]
pub enum TrainError {
    /// The requested target column does not exist
    #[error("unknown target column: {0}")]
    UnknownTarget(String),

    /// No numeric feature columns remain after excluding the target
    #[error("no numeric feature columns available")]
    NoFeatures,

    /// No rows survived null filtering
    #[error("no usable rows: {0}")]
    NoRows(String),

    /// The target column cannot support the requested problem type
    #[error("invalid target column '{column}': {reason}")]
    InvalidTarget {
        /// The target column name
        column: String,
        /// Why it cannot be used
        reason: String,
    },

    /// The underlying estimator failed to fit or predict
    #[error("model fitting failed: {0}")]
    Fit(String),

    /// The fitted model could not be serialized
    #[error("artifact serialization failed: {0}")]
    Serialize(String),
}
