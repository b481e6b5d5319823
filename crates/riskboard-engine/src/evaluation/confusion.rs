use std::collections::BTreeMap;

use ndarray::ArrayView1;
use serde::Serialize;

use crate::data_handling::Dataset;
use crate::error::ComputeError;
use crate::evaluation::synthetic::generate_confusion_matrix;
use crate::evaluation::Evaluated;
use crate::models::Classifier;
use crate::random::RandomSource;

/// Square count matrix: row `i` is true label `i`, column `j` predicted `j`.
///
/// Serializes as the bare nested list; `labels` names the rows/columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ConfusionMatrix {
    #[serde(skip)]
    labels: Vec<String>,
    matrix: Vec<Vec<u64>>,
}

impl ConfusionMatrix {
    pub fn with_labels(labels: Vec<String>, matrix: Vec<Vec<u64>>) -> Self {
        Self { labels, matrix }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn rows(&self) -> &[Vec<u64>] {
        &self.matrix
    }

    pub fn size(&self) -> usize {
        self.matrix.len()
    }

    pub fn get(&self, row: usize, col: usize) -> u64 {
        self.matrix[row][col]
    }

    pub fn is_square(&self) -> bool {
        self.matrix.iter().all(|row| row.len() == self.matrix.len())
    }

    pub fn total(&self) -> u64 {
        self.matrix.iter().flatten().sum()
    }

    pub fn trace(&self) -> u64 {
        (0..self.size()).map(|i| self.matrix[i][i]).sum()
    }
}

/// Count `(true, predicted)` pairs over the sorted distinct labels of
/// `y_true`. Predictions of a label absent from `y_true` are not counted.
pub fn confusion_from_labels(
    y_true: ArrayView1<'_, i64>,
    y_pred: ArrayView1<'_, i64>,
) -> Result<ConfusionMatrix, ComputeError> {
    if y_true.len() != y_pred.len() {
        return Err(ComputeError::LengthMismatch {
            expected: y_true.len(),
            actual: y_pred.len(),
        });
    }
    if y_true.is_empty() {
        return Err(ComputeError::EmptyInput("labels"));
    }

    let index: BTreeMap<i64, usize> = {
        let mut labels = y_true.to_vec();
        labels.sort_unstable();
        labels.dedup();
        labels.into_iter().enumerate().map(|(i, l)| (l, i)).collect()
    };

    let n = index.len();
    let mut matrix = vec![vec![0u64; n]; n];
    for (t, p) in y_true.iter().zip(y_pred.iter()) {
        if let (Some(&row), Some(&col)) = (index.get(t), index.get(p)) {
            matrix[row][col] += 1;
        }
    }

    let labels = index.keys().map(|l| l.to_string()).collect();
    Ok(ConfusionMatrix::with_labels(labels, matrix))
}

pub fn compute_confusion_matrix(model: &dyn Classifier, data: &Dataset) -> Result<ConfusionMatrix, ComputeError> {
    let y_pred = model.predict(data.x().view())?;
    confusion_from_labels(data.y().view(), y_pred.view())
}

pub fn calculate_confusion_matrix(
    model: Option<&dyn Classifier>,
    data: Option<&Dataset>,
    rng: &mut dyn RandomSource,
) -> Evaluated<ConfusionMatrix> {
    let (Some(model), Some(data)) = (model, data) else {
        return Evaluated::synthetic(generate_confusion_matrix(rng));
    };
    match compute_confusion_matrix(model, data) {
        Ok(cm) => Evaluated::real(cm),
        Err(err) => {
            log::warn!("Error calculating confusion matrix for {}: {}", model.name(), err);
            Evaluated::synthetic(generate_confusion_matrix(rng))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn counts_true_by_predicted() {
        let cm = confusion_from_labels(array![1, 0, 1, 1, 0].view(), array![1, 0, 0, 1, 1].view()).unwrap();
        assert_eq!(cm.labels().to_vec(), vec!["0".to_string(), "1".to_string()]);
        assert_eq!(cm.rows().to_vec(), vec![vec![1u64, 1], vec![1, 2]]);
        assert!(cm.is_square());
        assert_eq!(cm.total(), 5);
        assert_eq!(cm.trace(), 3);
    }

    #[test]
    fn predictions_outside_true_labels_are_dropped() {
        let cm = confusion_from_labels(array![0, 0, 0].view(), array![0, 1, 0].view()).unwrap();
        assert_eq!(cm.size(), 1);
        assert_eq!(cm.get(0, 0), 2);
    }

    #[test]
    fn serializes_as_nested_list() {
        let cm = ConfusionMatrix::with_labels(vec!["a".into(), "b".into()], vec![vec![3, 1], vec![0, 2]]);
        assert_eq!(serde_json::to_string(&cm).unwrap(), "[[3,1],[0,2]]");
    }
}
