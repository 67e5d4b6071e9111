//! Evaluation metrics
//!
//! Classification, regression, and clustering metrics computed directly over
//! prediction vectors.

use std::collections::BTreeSet;

/// Fraction of predictions that match the truth
pub fn accuracy(y_true: &[i32], y_pred: &[i32]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let correct = y_true
        .iter()
        .zip(y_pred)
        .filter(|(truth, pred)| truth == pred)
        .count();
    correct as f64 / y_true.len() as f64
}

/// Macro-averaged precision, recall, and F1
///
/// Averages the per-class scores over every class present in either vector.
/// Classes with no predicted (or no true) members contribute zero to the
/// respective score, matching the scikit-learn `zero_division=0` behavior.
pub fn precision_recall_f1_macro(y_true: &[i32], y_pred: &[i32]) -> (f64, f64, f64) {
    let classes: BTreeSet<i32> = y_true.iter().chain(y_pred).copied().collect();
    if classes.is_empty() {
        return (0.0, 0.0, 0.0);
    }

    let mut precision_sum = 0.0;
    let mut recall_sum = 0.0;
    let mut f1_sum = 0.0;

    for &class in &classes {
        let tp = y_true
            .iter()
            .zip(y_pred)
            .filter(|&(&truth, &pred)| truth == class && pred == class)
            .count() as f64;
        let predicted = y_pred.iter().filter(|&&p| p == class).count() as f64;
        let actual = y_true.iter().filter(|&&t| t == class).count() as f64;

        let precision = if predicted > 0.0 { tp / predicted } else { 0.0 };
        let recall = if actual > 0.0 { tp / actual } else { 0.0 };
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };

        precision_sum += precision;
        recall_sum += recall;
        f1_sum += f1;
    }

    let n = classes.len() as f64;
    (precision_sum / n, recall_sum / n, f1_sum / n)
}

/// Mean squared error
pub fn mean_squared_error(y_true: &[f64], y_pred: &[f64]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    y_true
        .iter()
        .zip(y_pred)
        .map(|(truth, pred)| (truth - pred).powi(2))
        .sum::<f64>()
        / y_true.len() as f64
}

/// Root mean squared error
pub fn root_mean_squared_error(y_true: &[f64], y_pred: &[f64]) -> f64 {
    mean_squared_error(y_true, y_pred).sqrt()
}

/// Mean absolute error
pub fn mean_absolute_error(y_true: &[f64], y_pred: &[f64]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    y_true
        .iter()
        .zip(y_pred)
        .map(|(truth, pred)| (truth - pred).abs())
        .sum::<f64>()
        / y_true.len() as f64
}

/// Coefficient of determination
///
/// 1.0 is a perfect fit; a constant-mean predictor scores 0.0. A constant
/// true vector yields 0.0 rather than a division by zero.
pub fn r2(y_true: &[f64], y_pred: &[f64]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let mean = y_true.iter().sum::<f64>() / y_true.len() as f64;
    let ss_tot: f64 = y_true.iter().map(|truth| (truth - mean).powi(2)).sum();
    if ss_tot == 0.0 {
        return 0.0;
    }
    let ss_res: f64 = y_true
        .iter()
        .zip(y_pred)
        .map(|(truth, pred)| (truth - pred).powi(2))
        .sum();
    1.0 - ss_res / ss_tot
}

/// Within-cluster sum of squared distances to the cluster mean
///
/// Centroids are recomputed from the labeled rows, so this works for any
/// labeling regardless of how the clusterer represents its centers.
pub fn inertia(rows: &[Vec<f64>], labels: &[i32]) -> f64 {
    if rows.is_empty() {
        return 0.0;
    }
    let dims = rows[0].len();
    let classes: BTreeSet<i32> = labels.iter().copied().collect();

    let mut total = 0.0;
    for class in classes {
        let members: Vec<&Vec<f64>> = rows
            .iter()
            .zip(labels)
            .filter(|(_, label)| **label == class)
            .map(|(row, _)| row)
            .collect();
        if members.is_empty() {
            continue;
        }
        let mut centroid = vec![0.0; dims];
        for row in &members {
            for (dim, value) in row.iter().enumerate() {
                centroid[dim] += value;
            }
        }
        for value in &mut centroid {
            *value /= members.len() as f64;
        }
        for row in &members {
            total += row
                .iter()
                .zip(&centroid)
                .map(|(a, b)| (a - b).powi(2))
                .sum::<f64>();
        }
    }
    total
}
