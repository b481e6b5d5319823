//! Small helpers shared by the built-in classifiers.
use ndarray::{Array1, ArrayView1, ArrayView2};

use crate::error::ComputeError;

/// Fail unless `x` has exactly `expected` columns.
pub fn check_width(expected: usize, x: &ArrayView2<'_, f64>) -> Result<(), ComputeError> {
    if x.ncols() != expected {
        return Err(ComputeError::ShapeMismatch {
            expected,
            actual: x.ncols(),
        });
    }
    Ok(())
}

/// Fail unless `x` and `y` describe the same number of rows and are non-empty.
pub fn check_training_set(x: &ArrayView2<'_, f64>, y: &ArrayView1<'_, i64>) -> Result<(), ComputeError> {
    if x.nrows() != y.len() {
        return Err(ComputeError::LengthMismatch {
            expected: x.nrows(),
            actual: y.len(),
        });
    }
    if y.is_empty() {
        return Err(ComputeError::EmptyInput("training set"));
    }
    Ok(())
}

/// Sorted distinct labels of a binary target. The last entry is the
/// positive class; a single-class target yields one entry.
pub fn binary_classes(y: &ArrayView1<'_, i64>) -> Result<Vec<i64>, ComputeError> {
    let mut classes = y.to_vec();
    classes.sort_unstable();
    classes.dedup();
    match classes.len() {
        0 => Err(ComputeError::EmptyInput("labels")),
        1 | 2 => Ok(classes),
        n => Err(ComputeError::InvalidParameter(format!(
            "binary classifier got {} distinct labels",
            n
        ))),
    }
}

/// Like [`binary_classes`] but rejects a single-class target, which the
/// linfa fitters cannot learn from.
pub fn two_classes(y: &ArrayView1<'_, i64>) -> Result<Vec<i64>, ComputeError> {
    let classes = binary_classes(y)?;
    if classes.len() < 2 {
        return Err(ComputeError::InvalidParameter(
            "training set holds a single class".to_string(),
        ));
    }
    Ok(classes)
}

/// `true` where `y` is the positive class of `classes`.
pub fn positive_mask(y: &ArrayView1<'_, i64>, classes: &[i64]) -> Array1<bool> {
    let positive = classes.last().copied();
    y.mapv(|label| Some(label) == positive)
}

/// Wrap a backend error with the model it came from.
pub fn backend_error(model: &str, err: impl std::fmt::Display) -> ComputeError {
    ComputeError::Model(format!("{}: {}", model, err))
}

pub fn not_fitted(model: &str) -> ComputeError {
    ComputeError::Model(format!("{} has no fitted state", model))
}

/// Map a positive/negative decision back onto a label from `classes`.
pub fn label_for(classes: &[i64], positive: bool) -> i64 {
    match (classes.first(), classes.last()) {
        (Some(&neg), Some(&pos)) => {
            if positive {
                pos
            } else {
                neg
            }
        }
        _ => 0,
    }
}

pub fn default_classes() -> Vec<i64> {
    vec![0, 1]
}
