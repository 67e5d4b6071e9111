//! Model roster and estimator dispatch
//!
//! Every estimator comes from smartcore; this module owns the mapping from
//! roster name + hyperparameters to fitted model.

use crate::ml::TrainError;
use serde::{Deserialize, Serialize};
use serde_json::json;
use smartcore::cluster::kmeans::{KMeans, KMeansParameters};
use smartcore::ensemble::random_forest_classifier::{
    RandomForestClassifier, RandomForestClassifierParameters,
};
use smartcore::ensemble::random_forest_regressor::{
    RandomForestRegressor, RandomForestRegressorParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::linear::linear_regression::{
    LinearRegression, LinearRegressionParameters, LinearRegressionSolverName,
};
use smartcore::linear::logistic_regression::{LogisticRegression, LogisticRegressionParameters};

/// Problem family a model belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProblemType {
    /// Predict a class label
    Classification,
    /// Predict a continuous value
    Regression,
    /// Group rows without a target
    Clustering,
}

impl ProblemType {
    /// Lowercase name used in API responses
    pub fn as_str(&self) -> &'static str {
        match self {
            ProblemType::Classification => "classification",
            ProblemType::Regression => "regression",
            ProblemType::Clustering => "clustering",
        }
    }
}

/// The trainable model roster
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelChoice {
    /// Random forest over class labels
    RandomForestClassifier,
    /// L2-regularized logistic regression
    LogisticRegression,
    /// Random forest over continuous targets
    RandomForestRegressor,
    /// Ordinary least squares
    LinearRegression,
    /// K-means clustering
    KMeans,
}

impl ModelChoice {
    /// Parse a roster name as sent by the client
    pub fn parse(name: &str) -> Option<ModelChoice> {
        match name {
            "RandomForestClassifier" => Some(ModelChoice::RandomForestClassifier),
            "LogisticRegression" => Some(ModelChoice::LogisticRegression),
            "RandomForestRegressor" => Some(ModelChoice::RandomForestRegressor),
            "LinearRegression" => Some(ModelChoice::LinearRegression),
            "KMeans" => Some(ModelChoice::KMeans),
            _ => None,
        }
    }

    /// Roster name
    pub fn name(&self) -> &'static str {
        match self {
            ModelChoice::RandomForestClassifier => "RandomForestClassifier",
            ModelChoice::LogisticRegression => "LogisticRegression",
            ModelChoice::RandomForestRegressor => "RandomForestRegressor",
            ModelChoice::LinearRegression => "LinearRegression",
            ModelChoice::KMeans => "KMeans",
        }
    }

    /// Problem family the model solves
    pub fn problem_type(&self) -> ProblemType {
        match self {
            ModelChoice::RandomForestClassifier | ModelChoice::LogisticRegression => {
                ProblemType::Classification
            }
            ModelChoice::RandomForestRegressor | ModelChoice::LinearRegression => {
                ProblemType::Regression
            }
            ModelChoice::KMeans => ProblemType::Clustering,
        }
    }

    /// Default hyperparameters exposed on `GET /hyperparameters`
    ///
    /// Keys and defaults follow the scikit-learn conventions clients expect.
    pub fn default_hyperparameters(&self) -> serde_json::Value {
        match self {
            ModelChoice::RandomForestClassifier | ModelChoice::RandomForestRegressor => json!({
                "n_estimators": 100,
                "max_depth": null,
                "min_samples_split": 2,
                "min_samples_leaf": 1,
                "seed": null,
            }),
            ModelChoice::LogisticRegression => json!({
                "alpha": 0.0,
                "seed": null,
            }),
            ModelChoice::LinearRegression => json!({
                "solver": "qr",
                "seed": null,
            }),
            ModelChoice::KMeans => json!({
                "n_clusters": 8,
                "max_iter": 300,
                "seed": null,
            }),
        }
    }
}

/// Resolved hyperparameters for one training run
///
/// Holds the union of roster parameters; each model reads only its own.
/// Parsing is lenient about value types because web clients tend to send
/// every edited form field as a string.
#[derive(Debug, Clone, PartialEq)]
pub struct Hyperparameters {
    /// Forest size
    pub n_estimators: u16,
    /// Tree depth cap; unlimited when absent
    pub max_depth: Option<u16>,
    /// Minimum samples to split an internal node
    pub min_samples_split: usize,
    /// Minimum samples in a leaf
    pub min_samples_leaf: usize,
    /// L2 regularization strength for logistic regression
    pub alpha: f64,
    /// Linear regression solver
    pub solver: LinearSolver,
    /// Cluster count for k-means
    pub n_clusters: usize,
    /// Iteration cap for k-means
    pub max_iter: usize,
    /// Seed for the split and the forests; unseeded when absent
    pub seed: Option<u64>,
}

/// Solver choices for ordinary least squares
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinearSolver {
    /// QR decomposition
    Qr,
    /// Singular value decomposition
    Svd,
}

impl LinearSolver {
    fn as_str(&self) -> &'static str {
        match self {
            LinearSolver::Qr => "qr",
            LinearSolver::Svd => "svd",
        }
    }
}

impl Default for Hyperparameters {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            alpha: 0.0,
            solver: LinearSolver::Qr,
            n_clusters: 8,
            max_iter: 300,
            seed: None,
        }
    }
}

impl Hyperparameters {
    /// Resolve a client-supplied parameter object against a model's keys
    ///
    /// Unknown keys and unparsable values are rejected with a message naming
    /// the key. Null and empty-string values fall back to the default.
    pub fn resolve(
        model: ModelChoice,
        params: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<Hyperparameters, String> {
        let allowed: &[&str] = match model {
            ModelChoice::RandomForestClassifier | ModelChoice::RandomForestRegressor => &[
                "n_estimators",
                "max_depth",
                "min_samples_split",
                "min_samples_leaf",
                "seed",
            ],
            ModelChoice::LogisticRegression => &["alpha", "seed"],
            ModelChoice::LinearRegression => &["solver", "seed"],
            ModelChoice::KMeans => &["n_clusters", "max_iter", "seed"],
        };

        let mut resolved = Hyperparameters::default();
        for (key, value) in params {
            if !allowed.contains(&key.as_str()) {
                return Err(format!(
                    "unknown hyperparameter '{}' for {}",
                    key,
                    model.name()
                ));
            }
            if is_absent(value) {
                continue;
            }
            match key.as_str() {
                "n_estimators" => {
                    resolved.n_estimators = parse_integer(key, value)?
                        .try_into()
                        .map_err(|_| format!("'{}' is out of range", key))?;
                }
                "max_depth" => {
                    resolved.max_depth = Some(
                        parse_integer(key, value)?
                            .try_into()
                            .map_err(|_| format!("'{}' is out of range", key))?,
                    );
                }
                "min_samples_split" => {
                    resolved.min_samples_split = parse_integer(key, value)? as usize;
                }
                "min_samples_leaf" => {
                    resolved.min_samples_leaf = parse_integer(key, value)? as usize;
                }
                "alpha" => {
                    resolved.alpha = parse_float(key, value)?;
                }
                "solver" => {
                    resolved.solver = match value.as_str().unwrap_or_default() {
                        "qr" => LinearSolver::Qr,
                        "svd" => LinearSolver::Svd,
                        other => return Err(format!("unknown solver '{}'", other)),
                    };
                }
                "n_clusters" => {
                    let k = parse_integer(key, value)? as usize;
                    if k == 0 {
                        return Err("'n_clusters' must be > 0".to_string());
                    }
                    resolved.n_clusters = k;
                }
                "max_iter" => {
                    let iters = parse_integer(key, value)? as usize;
                    if iters == 0 {
                        return Err("'max_iter' must be > 0".to_string());
                    }
                    resolved.max_iter = iters;
                }
                "seed" => {
                    resolved.seed = Some(parse_integer(key, value)?);
                }
                _ => unreachable!("key checked against allow-list"),
            }
        }
        if resolved.n_estimators == 0 {
            return Err("'n_estimators' must be > 0".to_string());
        }
        Ok(resolved)
    }

    /// The resolved values a model actually used, echoed into the artifact
    pub fn resolved_json(&self, model: ModelChoice) -> serde_json::Value {
        match model {
            ModelChoice::RandomForestClassifier | ModelChoice::RandomForestRegressor => json!({
                "n_estimators": self.n_estimators,
                "max_depth": self.max_depth,
                "min_samples_split": self.min_samples_split,
                "min_samples_leaf": self.min_samples_leaf,
                "seed": self.seed,
            }),
            ModelChoice::LogisticRegression => json!({
                "alpha": self.alpha,
                "seed": self.seed,
            }),
            ModelChoice::LinearRegression => json!({
                "solver": self.solver.as_str(),
                "seed": self.seed,
            }),
            ModelChoice::KMeans => json!({
                "n_clusters": self.n_clusters,
                "max_iter": self.max_iter,
                "seed": self.seed,
            }),
        }
    }
}

/// Null, empty string, and the literal strings "null"/"none" mean "use the default"
fn is_absent(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => true,
        serde_json::Value::String(s) => {
            let s = s.trim().to_ascii_lowercase();
            s.is_empty() || s == "null" || s == "none"
        }
        _ => false,
    }
}

fn parse_integer(key: &str, value: &serde_json::Value) -> Result<u64, String> {
    match value {
        serde_json::Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && *f >= 0.0).map(|f| f as u64)),
        serde_json::Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
    .ok_or_else(|| format!("'{}' must be a non-negative integer", key))
}

fn parse_float(key: &str, value: &serde_json::Value) -> Result<f64, String> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(|| format!("'{}' must be a number", key))
}

/// A fitted estimator, serializable into the model artifact
#[derive(Debug, Serialize, Deserialize)]
pub enum TrainedEstimator {
    /// Fitted random forest classifier
    RandomForestClassifier(RandomForestClassifier<f64, i32, DenseMatrix<f64>, Vec<i32>>),
    /// Fitted logistic regression
    LogisticRegression(LogisticRegression<f64, i32, DenseMatrix<f64>, Vec<i32>>),
    /// Fitted random forest regressor
    RandomForestRegressor(RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>),
    /// Fitted linear regression
    LinearRegression(LinearRegression<f64, f64, DenseMatrix<f64>, Vec<f64>>),
    /// Fitted k-means model
    KMeans(KMeans<f64, i32, DenseMatrix<f64>, Vec<i32>>),
}

impl TrainedEstimator {
    /// Fit a classification model
    pub fn fit_classifier(
        choice: ModelChoice,
        x: &DenseMatrix<f64>,
        y: &Vec<i32>,
        hp: &Hyperparameters,
    ) -> Result<TrainedEstimator, TrainError> {
        match choice {
            ModelChoice::RandomForestClassifier => {
                let mut params = RandomForestClassifierParameters::default()
                    .with_n_trees(hp.n_estimators)
                    .with_min_samples_leaf(hp.min_samples_leaf)
                    .with_min_samples_split(hp.min_samples_split);
                if let Some(depth) = hp.max_depth {
                    params = params.with_max_depth(depth);
                }
                if let Some(seed) = hp.seed {
                    params = params.with_seed(seed);
                }
                RandomForestClassifier::fit(x, y, params)
                    .map(TrainedEstimator::RandomForestClassifier)
                    .map_err(|e| TrainError::Fit(e.to_string()))
            }
            ModelChoice::LogisticRegression => {
                let params = LogisticRegressionParameters::default().with_alpha(hp.alpha);
                LogisticRegression::fit(x, y, params)
                    .map(TrainedEstimator::LogisticRegression)
                    .map_err(|e| TrainError::Fit(e.to_string()))
            }
            other => Err(TrainError::Fit(format!(
                "{} is not a classifier",
                other.name()
            ))),
        }
    }

    /// Fit a regression model
    pub fn fit_regressor(
        choice: ModelChoice,
        x: &DenseMatrix<f64>,
        y: &Vec<f64>,
        hp: &Hyperparameters,
    ) -> Result<TrainedEstimator, TrainError> {
        match choice {
            ModelChoice::RandomForestRegressor => {
                let mut params = RandomForestRegressorParameters::default()
                    .with_n_trees(hp.n_estimators as usize)
                    .with_min_samples_leaf(hp.min_samples_leaf)
                    .with_min_samples_split(hp.min_samples_split);
                if let Some(depth) = hp.max_depth {
                    params = params.with_max_depth(depth);
                }
                if let Some(seed) = hp.seed {
                    params = params.with_seed(seed);
                }
                RandomForestRegressor::fit(x, y, params)
                    .map(TrainedEstimator::RandomForestRegressor)
                    .map_err(|e| TrainError::Fit(e.to_string()))
            }
            ModelChoice::LinearRegression => {
                let solver = match hp.solver {
                    LinearSolver::Qr => LinearRegressionSolverName::QR,
                    LinearSolver::Svd => LinearRegressionSolverName::SVD,
                };
                let params = LinearRegressionParameters::default().with_solver(solver);
                LinearRegression::fit(x, y, params)
                    .map(TrainedEstimator::LinearRegression)
                    .map_err(|e| TrainError::Fit(e.to_string()))
            }
            other => Err(TrainError::Fit(format!(
                "{} is not a regressor",
                other.name()
            ))),
        }
    }

    /// Fit a clustering model
    pub fn fit_clusterer(
        x: &DenseMatrix<f64>,
        hp: &Hyperparameters,
    ) -> Result<TrainedEstimator, TrainError> {
        let params = KMeansParameters::default()
            .with_k(hp.n_clusters)
            .with_max_iter(hp.max_iter);
        let model: KMeans<f64, i32, DenseMatrix<f64>, Vec<i32>> =
            KMeans::fit(x, params).map_err(|e| TrainError::Fit(e.to_string()))?;
        Ok(TrainedEstimator::KMeans(model))
    }

    /// Predict class or cluster labels
    pub fn predict_labels(&self, x: &DenseMatrix<f64>) -> Result<Vec<i32>, TrainError> {
        match self {
            TrainedEstimator::RandomForestClassifier(model) => {
                model.predict(x).map_err(|e| TrainError::Fit(e.to_string()))
            }
            TrainedEstimator::LogisticRegression(model) => {
                model.predict(x).map_err(|e| TrainError::Fit(e.to_string()))
            }
            TrainedEstimator::KMeans(model) => {
                model.predict(x).map_err(|e| TrainError::Fit(e.to_string()))
            }
            _ => Err(TrainError::Fit(
                "estimator does not predict labels".to_string(),
            )),
        }
    }

    /// Predict continuous values
    pub fn predict_values(&self, x: &DenseMatrix<f64>) -> Result<Vec<f64>, TrainError> {
        match self {
            TrainedEstimator::RandomForestRegressor(model) => {
                model.predict(x).map_err(|e| TrainError::Fit(e.to_string()))
            }
            TrainedEstimator::LinearRegression(model) => {
                model.predict(x).map_err(|e| TrainError::Fit(e.to_string()))
            }
            _ => Err(TrainError::Fit(
                "estimator does not predict values".to_string(),
            )),
        }
    }
}
