//! Bounded-random stand-ins used when real evaluation is impossible or fails.
//!
//! All output is schema-valid: metrics stay in `[0, 1]`, the synthetic
//! confusion matrix keeps every diagonal range strictly above every
//! off-diagonal range, and learning curves have aligned, ascending sizes.
use chrono::Month;
use serde::Serialize;

use crate::evaluation::confusion::ConfusionMatrix;
use crate::evaluation::learning_curve::LearningCurve;
use crate::evaluation::metrics::MetricsReport;
use crate::random::{int_inclusive, uniform, RandomSource};

/// Inclusive `(low, high)` cell ranges of the synthetic 3x3 matrix
/// (rows/columns are Low, Medium, High risk).
pub const CONFUSION_RANGES: [[(u64, u64); 3]; 3] = [
    [(150, 200), (10, 30), (5, 15)],
    [(15, 35), (120, 160), (15, 25)],
    [(5, 15), (10, 30), (100, 140)],
];

pub const SYNTHETIC_SIZES: [usize; 6] = [10, 30, 50, 70, 90, 100];

const TRAIN_STEP: f64 = 0.01;
const VAL_STEP: f64 = 0.04;
const STEP_NOISE: f64 = 0.02;

/// Twelve month series of accuracy and loss (`1 - accuracy`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistorySeries {
    pub labels: Vec<String>,
    pub accuracy: Vec<f64>,
    pub loss: Vec<f64>,
}

/// Abbreviated calendar month labels, `Jan` through `Dec`.
pub fn month_labels() -> Vec<String> {
    (1..=12u8)
        .filter_map(|m| Month::try_from(m).ok())
        .map(|m| m.name().chars().take(3).collect())
        .collect()
}

pub fn generate_metrics(rng: &mut dyn RandomSource) -> MetricsReport {
    MetricsReport {
        accuracy: uniform(rng, 0.85, 0.95),
        precision: uniform(rng, 0.80, 0.92),
        recall: uniform(rng, 0.82, 0.94),
        f1: uniform(rng, 0.81, 0.93),
    }
}

pub fn generate_confusion_matrix(rng: &mut dyn RandomSource) -> ConfusionMatrix {
    let matrix = CONFUSION_RANGES
        .iter()
        .map(|row| {
            row.iter()
                .map(|&(low, high)| int_inclusive(rng, low, high))
                .collect()
        })
        .collect();
    ConfusionMatrix::with_labels(
        vec!["Low".to_string(), "Medium".to_string(), "High".to_string()],
        matrix,
    )
}

/// Train score falls from a high baseline, validation score rises from a
/// low one; each step moves by a fixed amount plus bounded noise.
pub fn generate_learning_curve(rng: &mut dyn RandomSource) -> LearningCurve {
    let base_train = uniform(rng, 0.90, 0.98);
    let train_scores = (0..SYNTHETIC_SIZES.len())
        .map(|i| base_train - i as f64 * TRAIN_STEP - uniform(rng, 0.0, STEP_NOISE))
        .collect();

    let base_val = uniform(rng, 0.60, 0.70);
    let val_scores = (0..SYNTHETIC_SIZES.len())
        .map(|i| base_val + i as f64 * VAL_STEP + uniform(rng, 0.0, STEP_NOISE))
        .collect();

    LearningCurve {
        sizes: SYNTHETIC_SIZES.to_vec(),
        train_scores,
        val_scores,
    }
}

pub fn generate_history(rng: &mut dyn RandomSource) -> HistorySeries {
    let labels = month_labels();
    let accuracy: Vec<f64> = labels.iter().map(|_| uniform(rng, 0.75, 0.98)).collect();
    let loss = accuracy.iter().map(|a| 1.0 - a).collect();
    HistorySeries {
        labels,
        accuracy,
        loss,
    }
}
