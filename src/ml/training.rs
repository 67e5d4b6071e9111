//! Training pipeline
//!
//! Runs the full train flow for one request: design matrix, train/test
//! split, fit, metric computation, and artifact assembly.

use crate::config::TrainingConfig;
use crate::ml::artifact::ModelArtifact;
use crate::ml::dataset::{build_supervised, build_unsupervised};
use crate::ml::estimators::{Hyperparameters, ModelChoice, ProblemType, TrainedEstimator};
use crate::ml::{metrics, TrainError};
use crate::table::DataFrame;
use chrono::Utc;
use smartcore::model_selection::train_test_split;
use std::collections::BTreeMap;

/// Result of one training run
#[derive(Debug)]
pub struct TrainOutcome {
    /// Roster name of the trained model
    pub model_name: String,
    /// Problem family
    pub problem_type: ProblemType,
    /// Evaluation metrics
    pub metrics: BTreeMap<String, f64>,
    /// Serializable artifact for hub persistence
    pub artifact: ModelArtifact,
}

/// Train a model on a table
///
/// Supervised models get a shuffled train/test split (skipped below the
/// configured minimum row count, in which case evaluation runs on the
/// training data); clustering fits and evaluates on every usable row.
pub fn train_on_frame(
    df: &DataFrame,
    choice: ModelChoice,
    hp: &Hyperparameters,
    config: &TrainingConfig,
    target: Option<&str>,
) -> Result<TrainOutcome, TrainError> {
    match choice.problem_type() {
        ProblemType::Classification => train_classifier(df, choice, hp, config, target),
        ProblemType::Regression => train_regressor(df, choice, hp, config, target),
        ProblemType::Clustering => train_clusterer(df, choice, hp),
    }
}

fn train_classifier(
    df: &DataFrame,
    choice: ModelChoice,
    hp: &Hyperparameters,
    config: &TrainingConfig,
    target: Option<&str>,
) -> Result<TrainOutcome, TrainError> {
    let data = build_supervised(df, target, ProblemType::Classification)?;

    let (x_train, x_test, y_train, y_test) = if data.feature_rows.len()
        >= config.min_rows_for_split
    {
        train_test_split(&data.x, &data.y_labels, config.test_fraction, true, hp.seed)
    } else {
        tracing::info!(
            rows = data.feature_rows.len(),
            "Dataset too small for a holdout split, evaluating on training data"
        );
        (
            data.x.clone(),
            data.x.clone(),
            data.y_labels.clone(),
            data.y_labels.clone(),
        )
    };

    let estimator = TrainedEstimator::fit_classifier(choice, &x_train, &y_train, hp)?;

    // A degenerate split can leave the holdout empty; fall back to train data
    let (x_eval, y_eval) = if y_test.is_empty() {
        (&x_train, &y_train)
    } else {
        (&x_test, &y_test)
    };
    let y_pred = estimator.predict_labels(x_eval)?;

    let mut results = BTreeMap::new();
    results.insert("accuracy".to_string(), metrics::accuracy(y_eval, &y_pred));
    let (precision, recall, f1) = metrics::precision_recall_f1_macro(y_eval, &y_pred);
    results.insert("precision_macro".to_string(), precision);
    results.insert("recall_macro".to_string(), recall);
    results.insert("f1_macro".to_string(), f1);

    tracing::info!(
        model = choice.name(),
        accuracy = results["accuracy"],
        "Classifier trained"
    );

    Ok(build_outcome(
        choice,
        hp,
        results,
        data.feature_names,
        Some(data.target_column),
        data.classes,
        estimator,
    ))
}

fn train_regressor(
    df: &DataFrame,
    choice: ModelChoice,
    hp: &Hyperparameters,
    config: &TrainingConfig,
    target: Option<&str>,
) -> Result<TrainOutcome, TrainError> {
    let data = build_supervised(df, target, ProblemType::Regression)?;

    let (x_train, x_test, y_train, y_test) = if data.feature_rows.len()
        >= config.min_rows_for_split
    {
        train_test_split(&data.x, &data.y_numeric, config.test_fraction, true, hp.seed)
    } else {
        tracing::info!(
            rows = data.feature_rows.len(),
            "Dataset too small for a holdout split, evaluating on training data"
        );
        (
            data.x.clone(),
            data.x.clone(),
            data.y_numeric.clone(),
            data.y_numeric.clone(),
        )
    };

    let estimator = TrainedEstimator::fit_regressor(choice, &x_train, &y_train, hp)?;

    let (x_eval, y_eval) = if y_test.is_empty() {
        (&x_train, &y_train)
    } else {
        (&x_test, &y_test)
    };
    let y_pred = estimator.predict_values(x_eval)?;

    let mut results = BTreeMap::new();
    results.insert(
        "mse".to_string(),
        metrics::mean_squared_error(y_eval, &y_pred),
    );
    results.insert(
        "rmse".to_string(),
        metrics::root_mean_squared_error(y_eval, &y_pred),
    );
    results.insert(
        "mae".to_string(),
        metrics::mean_absolute_error(y_eval, &y_pred),
    );
    results.insert("r2".to_string(), metrics::r2(y_eval, &y_pred));

    tracing::info!(model = choice.name(), r2 = results["r2"], "Regressor trained");

    Ok(build_outcome(
        choice,
        hp,
        results,
        data.feature_names,
        Some(data.target_column),
        Vec::new(),
        estimator,
    ))
}

fn train_clusterer(
    df: &DataFrame,
    choice: ModelChoice,
    hp: &Hyperparameters,
) -> Result<TrainOutcome, TrainError> {
    let data = build_unsupervised(df)?;

    if hp.n_clusters > data.feature_rows.len() {
        return Err(TrainError::Fit(format!(
            "n_clusters ({}) exceeds the {} usable rows",
            hp.n_clusters,
            data.feature_rows.len()
        )));
    }

    let estimator = TrainedEstimator::fit_clusterer(&data.x, hp)?;
    let labels = estimator.predict_labels(&data.x)?;

    let mut results = BTreeMap::new();
    results.insert(
        "inertia".to_string(),
        metrics::inertia(&data.feature_rows, &labels),
    );
    let distinct: std::collections::BTreeSet<i32> = labels.iter().copied().collect();
    results.insert("n_clusters".to_string(), distinct.len() as f64);

    tracing::info!(
        model = choice.name(),
        inertia = results["inertia"],
        "Clusterer trained"
    );

    Ok(build_outcome(
        choice,
        hp,
        results,
        data.feature_names,
        None,
        Vec::new(),
        estimator,
    ))
}

fn build_outcome(
    choice: ModelChoice,
    hp: &Hyperparameters,
    results: BTreeMap<String, f64>,
    feature_columns: Vec<String>,
    target_column: Option<String>,
    classes: Vec<String>,
    estimator: TrainedEstimator,
) -> TrainOutcome {
    let artifact = ModelArtifact {
        model_name: choice.name().to_string(),
        problem_type: choice.problem_type(),
        feature_columns,
        target_column,
        classes,
        hyperparameters: hp.resolved_json(choice),
        metrics: results.clone(),
        trained_at: Utc::now(),
        estimator,
    };
    TrainOutcome {
        model_name: choice.name().to_string(),
        problem_type: choice.problem_type(),
        metrics: results,
        artifact,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Value;

    fn config() -> TrainingConfig {
        TrainingConfig {
            test_fraction: 0.2,
            min_rows_for_split: 5,
        }
    }

    fn seeded() -> Hyperparameters {
        Hyperparameters {
            seed: Some(42),
            ..Hyperparameters::default()
        }
    }

    /// Two well-separated blobs labeled by which blob a row sits in
    fn classification_frame() -> DataFrame {
        let mut rows = Vec::new();
        for i in 0..10 {
            rows.push(vec![
                Value::Float(i as f64 * 0.1),
                Value::Float(1.0 + i as f64 * 0.1),
                Value::Str("low".to_string()),
            ]);
            rows.push(vec![
                Value::Float(10.0 + i as f64 * 0.1),
                Value::Float(11.0 + i as f64 * 0.1),
                Value::Str("high".to_string()),
            ]);
        }
        DataFrame::new(
            vec!["a".to_string(), "b".to_string(), "label".to_string()],
            rows,
        )
        .unwrap()
    }

    fn regression_frame() -> DataFrame {
        let rows = (0..20)
            .map(|i| {
                let x = i as f64;
                vec![Value::Float(x), Value::Float(2.0 * x + 1.0)]
            })
            .collect();
        DataFrame::new(vec!["x".to_string(), "y".to_string()], rows).unwrap()
    }

    #[test]
    fn test_random_forest_classifier_on_separable_blobs() {
        let outcome = train_on_frame(
            &classification_frame(),
            ModelChoice::RandomForestClassifier,
            &seeded(),
            &config(),
            None,
        )
        .unwrap();

        assert_eq!(outcome.problem_type, ProblemType::Classification);
        let accuracy = outcome.metrics["accuracy"];
        assert!((0.0..=1.0).contains(&accuracy));
        assert!(outcome.metrics.contains_key("f1_macro"));
        assert_eq!(outcome.artifact.classes, vec!["high", "low"]);
        assert_eq!(outcome.artifact.target_column.as_deref(), Some("label"));
    }

    #[test]
    fn test_linear_regression_recovers_line() {
        let outcome = train_on_frame(
            &regression_frame(),
            ModelChoice::LinearRegression,
            &seeded(),
            &config(),
            None,
        )
        .unwrap();

        assert_eq!(outcome.problem_type, ProblemType::Regression);
        // y = 2x + 1 is exactly linear, the fit should be near-perfect
        assert!(outcome.metrics["r2"] > 0.99);
        assert!(outcome.metrics["mse"] < 1e-6);
    }

    #[test]
    fn test_kmeans_two_blobs() {
        let mut params = serde_json::Map::new();
        params.insert("n_clusters".to_string(), serde_json::json!(2));
        let hp = Hyperparameters::resolve(ModelChoice::KMeans, &params).unwrap();

        let rows = vec![
            vec![Value::Float(0.0), Value::Float(0.1)],
            vec![Value::Float(0.2), Value::Float(0.0)],
            vec![Value::Float(0.1), Value::Float(0.2)],
            vec![Value::Float(9.9), Value::Float(10.0)],
            vec![Value::Float(10.1), Value::Float(9.8)],
            vec![Value::Float(10.0), Value::Float(10.2)],
        ];
        let df = DataFrame::new(vec!["a".to_string(), "b".to_string()], rows).unwrap();

        let outcome =
            train_on_frame(&df, ModelChoice::KMeans, &hp, &config(), None).unwrap();
        assert_eq!(outcome.problem_type, ProblemType::Clustering);
        assert_eq!(outcome.metrics["n_clusters"], 2.0);
        assert!(outcome.metrics["inertia"] >= 0.0);
        assert!(outcome.artifact.target_column.is_none());
    }

    #[test]
    fn test_kmeans_more_clusters_than_rows_rejected() {
        let rows = vec![
            vec![Value::Float(0.0)],
            vec![Value::Float(1.0)],
        ];
        let df = DataFrame::new(vec!["a".to_string()], rows).unwrap();
        let result = train_on_frame(
            &df,
            ModelChoice::KMeans,
            &Hyperparameters::default(),
            &config(),
            None,
        );
        assert!(matches!(result, Err(TrainError::Fit(_))));
    }

    #[test]
    fn test_tiny_dataset_skips_split() {
        let rows = (0..4)
            .map(|i| {
                let x = i as f64;
                vec![Value::Float(x), Value::Float(3.0 * x)]
            })
            .collect();
        let df = DataFrame::new(vec!["x".to_string(), "y".to_string()], rows).unwrap();

        let outcome = train_on_frame(
            &df,
            ModelChoice::LinearRegression,
            &seeded(),
            &config(),
            None,
        )
        .unwrap();
        // Evaluated on the training rows: exact line, exact fit
        assert!(outcome.metrics["mse"] < 1e-6);
    }

    #[test]
    fn test_artifact_round_trip() {
        let outcome = train_on_frame(
            &regression_frame(),
            ModelChoice::LinearRegression,
            &seeded(),
            &config(),
            None,
        )
        .unwrap();

        let bytes = outcome.artifact.to_json_bytes().unwrap();
        let restored = ModelArtifact::from_json_bytes(&bytes).unwrap();
        assert_eq!(restored.model_name, "LinearRegression");
        assert_eq!(restored.problem_type, ProblemType::Regression);
        assert_eq!(restored.metrics, outcome.metrics);
    }
}
