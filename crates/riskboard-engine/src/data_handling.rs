//! The evaluation dataset and the fold helpers used by cross-validation.
//!
//! A `Dataset` is immutable once built: a feature matrix with named columns
//! and a row-aligned label vector. Loading and scaling happen before
//! construction (see [`crate::io`] and [`crate::preprocessing`]).
use std::collections::BTreeMap;

use ndarray::{Array1, Array2, Axis};

use crate::error::{ComputeError, DatasetError};

#[derive(Debug, Clone)]
pub struct Dataset {
    feature_names: Vec<String>,
    x: Array2<f64>,
    y: Array1<i64>,
}

/// Train/test row indices for one cross-validation fold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fold {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

impl Dataset {
    pub fn new(
        feature_names: Vec<String>,
        x: Array2<f64>,
        y: Array1<i64>,
    ) -> Result<Self, DatasetError> {
        if x.nrows() != y.len() {
            return Err(DatasetError::RowMismatch {
                rows: x.nrows(),
                labels: y.len(),
            });
        }
        if x.ncols() != feature_names.len() {
            return Err(DatasetError::ColumnMismatch {
                cols: x.ncols(),
                names: feature_names.len(),
            });
        }
        Ok(Self {
            feature_names,
            x,
            y,
        })
    }

    /// Build a dataset with positional column names (`Feature 0`, ...).
    pub fn unnamed(x: Array2<f64>, y: Array1<i64>) -> Result<Self, DatasetError> {
        let names = (0..x.ncols()).map(|i| format!("Feature {}", i)).collect();
        Self::new(names, x, y)
    }

    pub fn x(&self) -> &Array2<f64> {
        &self.x
    }

    pub fn y(&self) -> &Array1<i64> {
        &self.y
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn n_records(&self) -> usize {
        self.y.len()
    }

    pub fn n_features(&self) -> usize {
        self.x.ncols()
    }

    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    /// Number of records whose ground-truth label equals `positive_label`.
    pub fn positive_count(&self, positive_label: i64) -> usize {
        self.y.iter().filter(|&&label| label == positive_label).count()
    }

    /// Sorted distinct labels present in `y`.
    pub fn class_labels(&self) -> Vec<i64> {
        let mut labels = self.y.to_vec();
        labels.sort_unstable();
        labels.dedup();
        labels
    }

    /// Copy out the rows at `indices` (in the given order).
    pub fn select_rows(&self, indices: &[usize]) -> (Array2<f64>, Array1<i64>) {
        (
            self.x.select(Axis(0), indices),
            self.y.select(Axis(0), indices),
        )
    }

    /// Deterministic stratified k-fold split.
    ///
    /// Records of each class (in row order) are dealt round-robin across the
    /// folds, continuing the rotation from one class to the next so fold
    /// sizes differ by at most one. Index lists are ascending.
    pub fn stratified_folds(&self, n_folds: usize) -> Result<Vec<Fold>, ComputeError> {
        if n_folds < 2 {
            return Err(ComputeError::InvalidParameter(format!(
                "cross-validation needs at least 2 folds, got {}",
                n_folds
            )));
        }
        if self.n_records() < n_folds {
            return Err(ComputeError::InvalidParameter(format!(
                "cannot split {} records into {} folds",
                self.n_records(),
                n_folds
            )));
        }

        let mut by_class: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
        for (row, &label) in self.y.iter().enumerate() {
            by_class.entry(label).or_default().push(row);
        }

        let mut fold_of = vec![0usize; self.n_records()];
        let mut dealt = 0usize;
        for rows in by_class.values() {
            for &row in rows {
                fold_of[row] = dealt % n_folds;
                dealt += 1;
            }
        }

        let folds = (0..n_folds)
            .map(|fold| {
                let (test, train): (Vec<usize>, Vec<usize>) =
                    (0..self.n_records()).partition(|&row| fold_of[row] == fold);
                Fold { train, test }
            })
            .collect();

        Ok(folds)
    }

    pub fn log_summary(&self) {
        log::info!(
            "Dataset: {} records, {} features, classes {:?}",
            self.n_records(),
            self.n_features(),
            self.class_labels()
        );
        log::debug!("Feature columns: {:?}", self.feature_names);
    }
}
