//! Integration tests for the training pipeline
//!
//! These tests run the full train flow the `/train-model` handler drives,
//! minus the HTTP and hub layers: CSV bytes in, fitted artifact out.

use zeroml_backend::config::TrainingConfig;
use zeroml_backend::ml::{
    artifact, train_on_frame, Hyperparameters, ModelArtifact, ModelChoice, ProblemType,
};
use zeroml_backend::table::{read_table, FileFormat};

fn training_config() -> TrainingConfig {
    TrainingConfig {
        test_fraction: 0.2,
        min_rows_for_split: 5,
    }
}

/// Hyperparameters the way the frontend sends them: a JSON object whose
/// values are strings
fn form_params(pairs: &[(&str, &str)]) -> serde_json::Map<String, serde_json::Value> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), serde_json::json!(v)))
        .collect()
}

fn classification_csv() -> Vec<u8> {
    let mut csv = String::from("sepal,petal,species\n");
    for i in 0..15 {
        csv.push_str(&format!("{:.1},{:.1},setosa\n", 1.0 + i as f64 * 0.1, 0.2));
        csv.push_str(&format!("{:.1},{:.1},virginica\n", 6.0 + i as f64 * 0.1, 2.0));
    }
    csv.into_bytes()
}

fn regression_csv() -> Vec<u8> {
    let mut csv = String::from("x1,x2,y\n");
    for i in 0..25 {
        let x1 = i as f64;
        let x2 = (i % 5) as f64;
        csv.push_str(&format!("{},{},{}\n", x1, x2, 3.0 * x1 - 2.0 * x2 + 5.0));
    }
    csv.into_bytes()
}

#[test]
fn test_classification_flow_with_form_params() {
    let df = read_table(FileFormat::Csv, &classification_csv()).unwrap();
    let params = form_params(&[("n_estimators", "20"), ("seed", "7")]);
    let hp = Hyperparameters::resolve(ModelChoice::RandomForestClassifier, &params).unwrap();

    let outcome = train_on_frame(
        &df,
        ModelChoice::RandomForestClassifier,
        &hp,
        &training_config(),
        None,
    )
    .unwrap();

    assert_eq!(outcome.problem_type, ProblemType::Classification);
    assert_eq!(outcome.model_name, "RandomForestClassifier");
    for metric in ["accuracy", "precision_macro", "recall_macro", "f1_macro"] {
        let value = outcome.metrics[metric];
        assert!(
            (0.0..=1.0).contains(&value),
            "{} should be a fraction, got {}",
            metric,
            value
        );
    }
    // Blobs are far apart; the forest should separate them
    assert!(outcome.metrics["accuracy"] > 0.8);
    assert_eq!(outcome.artifact.classes, vec!["setosa", "virginica"]);
}

#[test]
fn test_logistic_regression_flow() {
    let df = read_table(FileFormat::Csv, &classification_csv()).unwrap();
    let hp = Hyperparameters::resolve(
        ModelChoice::LogisticRegression,
        &form_params(&[("seed", "7")]),
    )
    .unwrap();

    let outcome = train_on_frame(
        &df,
        ModelChoice::LogisticRegression,
        &hp,
        &training_config(),
        Some("species"),
    )
    .unwrap();

    assert_eq!(outcome.problem_type, ProblemType::Classification);
    assert!(outcome.metrics["accuracy"] > 0.8);
}

#[test]
fn test_regression_flow_recovers_linear_target() {
    let df = read_table(FileFormat::Csv, &regression_csv()).unwrap();
    let hp = Hyperparameters::resolve(
        ModelChoice::LinearRegression,
        &form_params(&[("solver", "qr"), ("seed", "3")]),
    )
    .unwrap();

    let outcome = train_on_frame(
        &df,
        ModelChoice::LinearRegression,
        &hp,
        &training_config(),
        None,
    )
    .unwrap();

    assert_eq!(outcome.problem_type, ProblemType::Regression);
    assert!(outcome.metrics["r2"] > 0.99);
    assert!(outcome.metrics["rmse"] < 1e-3);
}

#[test]
fn test_random_forest_regressor_flow() {
    let df = read_table(FileFormat::Csv, &regression_csv()).unwrap();
    let hp = Hyperparameters::resolve(
        ModelChoice::RandomForestRegressor,
        &form_params(&[("n_estimators", "30"), ("seed", "11")]),
    )
    .unwrap();

    let outcome = train_on_frame(
        &df,
        ModelChoice::RandomForestRegressor,
        &hp,
        &training_config(),
        None,
    )
    .unwrap();

    assert_eq!(outcome.problem_type, ProblemType::Regression);
    for metric in ["mse", "rmse", "mae", "r2"] {
        assert!(outcome.metrics.contains_key(metric), "missing {}", metric);
    }
    assert!(outcome.metrics["mse"] >= 0.0);
}

#[test]
fn test_clustering_flow_ignores_non_numeric_columns() {
    let mut csv = String::from("a,b,label\n");
    for i in 0..10 {
        csv.push_str(&format!("{:.1},{:.1},x\n", i as f64 * 0.1, i as f64 * 0.1));
        csv.push_str(&format!("{:.1},{:.1},y\n", 8.0 + i as f64 * 0.1, 8.0));
    }
    let df = read_table(FileFormat::Csv, csv.as_bytes()).unwrap();
    let hp =
        Hyperparameters::resolve(ModelChoice::KMeans, &form_params(&[("n_clusters", "2")]))
            .unwrap();

    let outcome =
        train_on_frame(&df, ModelChoice::KMeans, &hp, &training_config(), None).unwrap();

    assert_eq!(outcome.problem_type, ProblemType::Clustering);
    assert_eq!(outcome.metrics["n_clusters"], 2.0);
    // Text columns never enter the design matrix
    assert_eq!(outcome.artifact.feature_columns, vec!["a", "b"]);
}

#[test]
fn test_artifact_persists_and_reloads() {
    let df = read_table(FileFormat::Csv, &regression_csv()).unwrap();
    let hp = Hyperparameters::default();
    let outcome = train_on_frame(
        &df,
        ModelChoice::LinearRegression,
        &hp,
        &training_config(),
        None,
    )
    .unwrap();

    let path = artifact::artifact_path("session-1", &outcome.model_name, &outcome.artifact.trained_at);
    assert!(path.starts_with("models/session-1_LinearRegression_"));
    assert!(path.ends_with(".json"));

    let bytes = outcome.artifact.to_json_bytes().unwrap();
    let restored = ModelArtifact::from_json_bytes(&bytes).unwrap();
    assert_eq!(restored.feature_columns, vec!["x1", "x2"]);
    assert_eq!(restored.target_column.as_deref(), Some("y"));
    assert_eq!(restored.hyperparameters["solver"], "qr");
}

#[test]
fn test_unknown_target_column_is_rejected() {
    let df = read_table(FileFormat::Csv, &regression_csv()).unwrap();
    let result = train_on_frame(
        &df,
        ModelChoice::LinearRegression,
        &Hyperparameters::default(),
        &training_config(),
        Some("does_not_exist"),
    );
    assert!(result.is_err());
}
