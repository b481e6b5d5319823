//! Stub classifiers and datasets shared by the integration tests.
#![allow(dead_code)]

use std::thread;
use std::time::Duration;

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use riskboard_engine::data_handling::Dataset;
use riskboard_engine::models::{Capabilities, Capability, Classifier};
use riskboard_engine::ComputeError;

/// Interleaved two-class dataset, separable on the first feature.
pub fn separable_dataset(n: usize) -> Dataset {
    let mut values = Vec::with_capacity(n * 2);
    let mut labels = Vec::with_capacity(n);
    for i in 0..n {
        let label = (i % 2) as i64;
        let sign = if label == 1 { 1.0 } else { -1.0 };
        values.push(sign * (1.0 + (i % 5) as f64 * 0.2));
        values.push((i % 3) as f64 * 0.1);
        labels.push(label);
    }
    let x = Array2::from_shape_vec((n, 2), values).unwrap();
    Dataset::new(
        vec!["Glucose".to_string(), "BMI".to_string()],
        x,
        Array1::from(labels),
    )
    .unwrap()
}

/// `n` records of all-zero features; the first `positives` are labelled 1.
pub fn labelled_dataset(n: usize, positives: usize) -> Dataset {
    let x = Array2::<f64>::zeros((n, 3));
    let y = Array1::from_iter((0..n).map(|i| if i < positives { 1 } else { 0 }));
    Dataset::unnamed(x, y).unwrap()
}

/// Returns fixed positive-class probabilities and labels derived from them.
pub struct FixedProbabilities(pub Vec<f64>);

impl Classifier for FixedProbabilities {
    fn capabilities(&self) -> Capabilities {
        Capabilities::PREDICT_ONLY.with(Capability::PredictProba)
    }

    fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Array1<i64>, ComputeError> {
        Ok(self.predict_proba(x)?.mapv(|p| (p >= 0.5) as i64))
    }

    fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>, ComputeError> {
        if x.nrows() != self.0.len() {
            return Err(ComputeError::LengthMismatch {
                expected: self.0.len(),
                actual: x.nrows(),
            });
        }
        Ok(Array1::from(self.0.clone()))
    }
}

/// Claims every capability and fails at all of them.
pub struct Failing;

impl Classifier for Failing {
    fn name(&self) -> &str {
        "failing"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::PREDICT_ONLY
            .with(Capability::PredictProba)
            .with(Capability::Refit)
    }

    fn predict(&self, _x: ArrayView2<'_, f64>) -> Result<Array1<i64>, ComputeError> {
        Err(ComputeError::Model("predict exploded".to_string()))
    }

    fn predict_proba(&self, _x: ArrayView2<'_, f64>) -> Result<Array1<f64>, ComputeError> {
        Err(ComputeError::Model("predict_proba exploded".to_string()))
    }

    fn refit(
        &self,
        _x: ArrayView2<'_, f64>,
        _y: ArrayView1<'_, i64>,
    ) -> Result<Box<dyn Classifier>, ComputeError> {
        Err(ComputeError::Model("refit exploded".to_string()))
    }
}

/// Predicts the negative class; every refit sleeps before returning.
pub struct SlowRefit(pub Duration);

impl Classifier for SlowRefit {
    fn capabilities(&self) -> Capabilities {
        Capabilities::PREDICT_ONLY.with(Capability::Refit)
    }

    fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Array1<i64>, ComputeError> {
        Ok(Array1::zeros(x.nrows()))
    }

    fn refit(
        &self,
        _x: ArrayView2<'_, f64>,
        _y: ArrayView1<'_, i64>,
    ) -> Result<Box<dyn Classifier>, ComputeError> {
        thread::sleep(self.0);
        Ok(Box::new(SlowRefit(self.0)))
    }
}

/// Label prediction only.
pub struct PredictOnly;

impl Classifier for PredictOnly {
    fn capabilities(&self) -> Capabilities {
        Capabilities::PREDICT_ONLY
    }

    fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Array1<i64>, ComputeError> {
        Ok(Array1::ones(x.nrows()))
    }
}

/// Coefficients only, no recorded feature names.
pub struct CoefficientsOnly(pub Vec<f64>);

impl Classifier for CoefficientsOnly {
    fn capabilities(&self) -> Capabilities {
        Capabilities::PREDICT_ONLY.with(Capability::Coefficients)
    }

    fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Array1<i64>, ComputeError> {
        Ok(Array1::zeros(x.nrows()))
    }

    fn coefficients(&self) -> Option<Array2<f64>> {
        Array2::from_shape_vec((1, self.0.len()), self.0.clone()).ok()
    }
}
