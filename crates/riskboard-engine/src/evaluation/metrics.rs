use std::collections::BTreeMap;

use ndarray::ArrayView1;
use serde::Serialize;

use crate::data_handling::Dataset;
use crate::error::ComputeError;
use crate::evaluation::synthetic::generate_metrics;
use crate::evaluation::Evaluated;
use crate::models::Classifier;
use crate::random::RandomSource;

/// Accuracy plus support-weighted precision, recall and F1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricsReport {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

impl MetricsReport {
    pub fn is_within_unit_range(&self) -> bool {
        [self.accuracy, self.precision, self.recall, self.f1]
            .iter()
            .all(|v| (0.0..=1.0).contains(v))
    }
}

#[derive(Default)]
struct ClassTally {
    true_positive: usize,
    predicted: usize,
    support: usize,
}

fn check_pair(y_true: &ArrayView1<'_, i64>, y_pred: &ArrayView1<'_, i64>) -> Result<(), ComputeError> {
    if y_true.len() != y_pred.len() {
        return Err(ComputeError::LengthMismatch {
            expected: y_true.len(),
            actual: y_pred.len(),
        });
    }
    if y_true.is_empty() {
        return Err(ComputeError::EmptyInput("labels"));
    }
    Ok(())
}

/// Fraction of exact label matches.
pub fn accuracy_score(y_true: ArrayView1<'_, i64>, y_pred: ArrayView1<'_, i64>) -> Result<f64, ComputeError> {
    check_pair(&y_true, &y_pred)?;
    let hits = y_true.iter().zip(y_pred.iter()).filter(|(t, p)| t == p).count();
    Ok(hits as f64 / y_true.len() as f64)
}

/// Score predictions against ground truth.
///
/// Per-class precision/recall/F1 are averaged with weights equal to each
/// class's support in `y_true`. Classes that only appear in `y_pred` carry
/// zero weight, and any zero denominator contributes `0.0`.
pub fn score_predictions(
    y_true: ArrayView1<'_, i64>,
    y_pred: ArrayView1<'_, i64>,
) -> Result<MetricsReport, ComputeError> {
    check_pair(&y_true, &y_pred)?;

    let mut tallies: BTreeMap<i64, ClassTally> = BTreeMap::new();
    let mut hits = 0usize;
    for (&t, &p) in y_true.iter().zip(y_pred.iter()) {
        tallies.entry(t).or_default().support += 1;
        tallies.entry(p).or_default().predicted += 1;
        if t == p {
            hits += 1;
            tallies.entry(t).or_default().true_positive += 1;
        }
    }

    let n = y_true.len() as f64;
    let ratio = |num: usize, den: usize| if den == 0 { 0.0 } else { num as f64 / den as f64 };

    let (mut precision, mut recall, mut f1) = (0.0, 0.0, 0.0);
    for tally in tallies.values() {
        let p = ratio(tally.true_positive, tally.predicted);
        let r = ratio(tally.true_positive, tally.support);
        let f = if p + r == 0.0 { 0.0 } else { 2.0 * p * r / (p + r) };
        let weight = tally.support as f64 / n;
        precision += weight * p;
        recall += weight * r;
        f1 += weight * f;
    }

    Ok(MetricsReport {
        accuracy: hits as f64 / n,
        precision,
        recall,
        f1,
    })
}

/// Run inference over the whole dataset and score it.
pub fn compute_metrics(model: &dyn Classifier, data: &Dataset) -> Result<MetricsReport, ComputeError> {
    let y_pred = model.predict(data.x().view())?;
    score_predictions(data.y().view(), y_pred.view())
}

/// Accuracy only, for model comparison.
pub fn compute_accuracy(model: &dyn Classifier, data: &Dataset) -> Result<f64, ComputeError> {
    let y_pred = model.predict(data.x().view())?;
    accuracy_score(data.y().view(), y_pred.view())
}

pub fn calculate_metrics(
    model: Option<&dyn Classifier>,
    data: Option<&Dataset>,
    rng: &mut dyn RandomSource,
) -> Evaluated<MetricsReport> {
    let (Some(model), Some(data)) = (model, data) else {
        return Evaluated::synthetic(generate_metrics(rng));
    };
    match compute_metrics(model, data) {
        Ok(report) => Evaluated::real(report),
        Err(err) => {
            log::warn!("Error calculating metrics for {}: {}", model.name(), err);
            Evaluated::synthetic(generate_metrics(rng))
        }
    }
}
