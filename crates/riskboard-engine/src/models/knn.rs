use linfa_nn::distance::L2Dist;
use linfa_nn::{CommonNearestNeighbour, NearestNeighbour, NearestNeighbourIndex};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::ComputeError;
use crate::models::classifier_trait::{Capabilities, Capability, Classifier};
use crate::models::utils::{backend_error, binary_classes, check_training_set, check_width, label_for};

const NAME: &str = "k_nearest_neighbors";

fn default_k() -> usize {
    5
}

/// k-nearest-neighbours vote over a stored reference set. Neighbours come
/// from a `linfa-nn` k-d tree under Euclidean distance.
///
/// The reference set is the fitted state; a model file without one names
/// `training_data` instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KNearestNeighbors {
    #[serde(default = "default_k")]
    pub k: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub train_x: Vec<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub train_y: Vec<i64>,
    #[serde(default)]
    pub feature_names: Option<Vec<String>>,
}

impl KNearestNeighbors {
    pub fn fit(k: usize, x: ArrayView2<'_, f64>, y: ArrayView1<'_, i64>) -> Result<Self, ComputeError> {
        check_training_set(&x, &y)?;
        binary_classes(&y)?;
        let model = Self {
            k,
            train_x: x.rows().into_iter().map(|row| row.to_vec()).collect(),
            train_y: y.to_vec(),
            feature_names: None,
        };
        model.validate()?;
        Ok(model)
    }

    pub fn is_fitted(&self) -> bool {
        !self.train_x.is_empty()
    }

    pub fn validate(&self) -> Result<(), ComputeError> {
        if self.k == 0 {
            return Err(ComputeError::InvalidParameter("k must be at least 1".to_string()));
        }
        if self.train_x.is_empty() {
            return Err(ComputeError::EmptyInput("reference set"));
        }
        if self.train_x.len() != self.train_y.len() {
            return Err(ComputeError::LengthMismatch {
                expected: self.train_x.len(),
                actual: self.train_y.len(),
            });
        }
        let width = self.n_features();
        if self.train_x.iter().any(|row| row.len() != width) {
            return Err(ComputeError::Model("ragged reference set".to_string()));
        }
        Ok(())
    }

    fn n_features(&self) -> usize {
        self.train_x.first().map_or(0, Vec::len)
    }

    fn classes(&self) -> Vec<i64> {
        let mut classes = self.train_y.clone();
        classes.sort_unstable();
        classes.dedup();
        classes
    }

    fn reference(&self) -> Result<Array2<f64>, ComputeError> {
        let flat: Vec<f64> = self.train_x.iter().flatten().copied().collect();
        Array2::from_shape_vec((self.train_x.len(), self.n_features()), flat)
            .map_err(|e| backend_error(NAME, e))
    }

    /// Fraction of the k nearest references carrying the positive label.
    fn probabilities(&self, x: &ArrayView2<'_, f64>) -> Result<(Vec<i64>, Array1<f64>), ComputeError> {
        check_width(self.n_features(), x)?;
        let classes = self.classes();
        let positive = classes.last().copied().unwrap_or_default();
        let reference = self.reference()?;
        let index = CommonNearestNeighbour::KdTree
            .from_batch(&reference, L2Dist)
            .map_err(|e| backend_error(NAME, e))?;
        let k = self.k.min(self.train_y.len());

        let probs = (0..x.nrows())
            .into_par_iter()
            .map(|i| -> Result<f64, ComputeError> {
                let neighbours = index
                    .k_nearest(x.row(i), k)
                    .map_err(|e| backend_error(NAME, e))?;
                let hits = neighbours
                    .iter()
                    .filter(|(_, idx)| self.train_y[*idx] == positive)
                    .count();
                Ok(hits as f64 / neighbours.len().max(1) as f64)
            })
            .collect::<Result<Vec<f64>, ComputeError>>()?;
        Ok((classes, Array1::from(probs)))
    }
}

impl Classifier for KNearestNeighbors {
    fn name(&self) -> &str {
        NAME
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::PREDICT_ONLY
            .with(Capability::PredictProba)
            .with(Capability::Refit)
    }

    fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Array1<i64>, ComputeError> {
        let (classes, probs) = self.probabilities(&x)?;
        Ok(probs.mapv(|p| label_for(&classes, p > 0.5)))
    }

    fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>, ComputeError> {
        Ok(self.probabilities(&x)?.1)
    }

    fn refit(
        &self,
        x: ArrayView2<'_, f64>,
        y: ArrayView1<'_, i64>,
    ) -> Result<Box<dyn Classifier>, ComputeError> {
        let mut fitted = KNearestNeighbors::fit(self.k, x, y)?;
        fitted.feature_names = self.feature_names.clone();
        Ok(Box::new(fitted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn votes_among_nearest_references() {
        let x = array![[0.0, 0.0], [0.1, 0.0], [0.0, 0.2], [5.0, 5.0], [5.1, 4.9], [4.8, 5.2]];
        let y = array![0, 0, 0, 1, 1, 1];
        let model = KNearestNeighbors::fit(3, x.view(), y.view()).unwrap();

        let probe = array![[0.05, 0.05], [5.0, 5.1]];
        assert_eq!(model.predict(probe.view()).unwrap(), array![0, 1]);
        let proba = model.predict_proba(probe.view()).unwrap();
        assert_eq!(proba, array![0.0, 1.0]);
        assert!(model.feature_importances().is_none());
        assert!(model.coefficients().is_none());
    }

    #[test]
    fn k_larger_than_reference_set_uses_all() {
        let x = array![[0.0], [1.0]];
        let y = array![0, 1];
        let model = KNearestNeighbors::fit(10, x.view(), y.view()).unwrap();
        let proba = model.predict_proba(array![[0.4]].view()).unwrap();
        assert_eq!(proba[0], 0.5);
    }

    #[test]
    fn reference_set_is_the_fitted_state() {
        let model: KNearestNeighbors = serde_json::from_str(r#"{"k": 3}"#).unwrap();
        assert!(!model.is_fitted());
        assert!(model.validate().is_err());

        let fitted = KNearestNeighbors::fit(1, array![[0.0], [1.0]].view(), array![0, 1].view()).unwrap();
        let json = serde_json::to_string(&fitted).unwrap();
        let restored: KNearestNeighbors = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, fitted);
    }
}
