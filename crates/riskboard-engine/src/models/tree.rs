use linfa::traits::{Fit, Predict};
use linfa::Dataset as LinfaDataset;
use linfa_trees::{DecisionTree as LinfaTree, SplitQuality};
use ndarray::{Array1, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::error::ComputeError;
use crate::models::classifier_trait::{Capabilities, Capability, Classifier};
use crate::models::utils::{
    backend_error, binary_classes, check_training_set, check_width, default_classes, label_for,
    not_fitted, positive_mask,
};

const NAME: &str = "decision_tree";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeParams {
    pub max_depth: Option<usize>,
    pub min_weight_split: f32,
    pub min_weight_leaf: f32,
    pub min_impurity_decrease: f64,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: Some(5),
            min_weight_split: 2.0,
            min_weight_leaf: 1.0,
            min_impurity_decrease: 1e-5,
        }
    }
}

/// CART decision tree (gini impurity) backed by `linfa-trees`.
///
/// The tree yields labels and impurity-based feature importances but no
/// class probabilities.
#[derive(Serialize, Deserialize)]
pub struct DecisionTree {
    #[serde(default)]
    pub params: TreeParams,
    #[serde(default)]
    pub feature_names: Option<Vec<String>>,
    #[serde(default = "default_classes")]
    pub classes: Vec<i64>,
    #[serde(default)]
    pub n_features: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    fitted: Option<LinfaTree<f64, bool>>,
}

impl DecisionTree {
    pub fn fit(
        params: TreeParams,
        x: ArrayView2<'_, f64>,
        y: ArrayView1<'_, i64>,
    ) -> Result<Self, ComputeError> {
        check_training_set(&x, &y)?;
        let classes = binary_classes(&y)?;
        let dataset = LinfaDataset::new(x.to_owned(), positive_mask(&y, &classes));

        let fitted = LinfaTree::params()
            .split_quality(SplitQuality::Gini)
            .max_depth(params.max_depth)
            .min_weight_split(params.min_weight_split)
            .min_weight_leaf(params.min_weight_leaf)
            .min_impurity_decrease(params.min_impurity_decrease)
            .fit(&dataset)
            .map_err(|e| backend_error(NAME, e))?;

        Ok(Self {
            params,
            feature_names: None,
            classes,
            n_features: x.ncols(),
            fitted: Some(fitted),
        })
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    pub fn validate(&self) -> Result<(), ComputeError> {
        self.fitted()?;
        if self.n_features == 0 {
            return Err(ComputeError::InvalidParameter(
                "n_features must be recorded with the fitted state".to_string(),
            ));
        }
        if self.params.max_depth == Some(0) {
            return Err(ComputeError::InvalidParameter("max_depth must be at least 1".to_string()));
        }
        Ok(())
    }

    fn fitted(&self) -> Result<&LinfaTree<f64, bool>, ComputeError> {
        self.fitted.as_ref().ok_or_else(|| not_fitted(NAME))
    }
}

impl Classifier for DecisionTree {
    fn name(&self) -> &str {
        NAME
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::PREDICT_ONLY
            .with(Capability::FeatureImportances)
            .with(Capability::Refit)
    }

    fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Array1<i64>, ComputeError> {
        let fitted = self.fitted()?;
        check_width(self.n_features, &x)?;
        let labels: Array1<bool> = fitted.predict(&x);
        Ok(labels.mapv(|positive| label_for(&self.classes, positive)))
    }

    fn feature_importances(&self) -> Option<Array1<f64>> {
        let fitted = self.fitted.as_ref()?;
        // a single-leaf tree normalizes by zero
        let importances = fitted
            .feature_importance()
            .into_iter()
            .map(|v| if v.is_finite() { v } else { 0.0 })
            .collect::<Vec<f64>>();
        Some(Array1::from(importances))
    }

    fn refit(
        &self,
        x: ArrayView2<'_, f64>,
        y: ArrayView1<'_, i64>,
    ) -> Result<Box<dyn Classifier>, ComputeError> {
        let mut fitted = DecisionTree::fit(self.params.clone(), x, y)?;
        fitted.feature_names = self.feature_names.clone();
        Ok(Box::new(fitted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn splits_on_the_informative_feature() {
        // feature 1 separates the classes, feature 0 is noise
        let x = array![
            [0.3, 0.0],
            [0.9, 0.1],
            [0.5, 0.2],
            [0.2, 0.8],
            [0.8, 0.9],
            [0.4, 1.0]
        ];
        let y = array![0, 0, 0, 1, 1, 1];
        let model = DecisionTree::fit(TreeParams::default(), x.view(), y.view()).unwrap();

        assert_eq!(model.predict(x.view()).unwrap(), y);
        let importances = model.feature_importances().unwrap();
        assert_eq!(importances.len(), 2);
        assert!(importances[1] > importances[0]);
        assert!(model.predict_proba(x.view()).is_err());
    }

    #[test]
    fn pure_target_predicts_its_label() {
        let x = array![[1.0], [2.0], [3.0]];
        let y = array![4, 4, 4];
        let model = DecisionTree::fit(TreeParams::default(), x.view(), y.view()).unwrap();
        assert_eq!(model.predict(array![[10.0]].view()).unwrap(), array![4]);
        assert!(model.feature_importances().unwrap().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn refit_keeps_hyper_parameters_and_names() {
        let x = array![[0.0], [0.1], [0.9], [1.0]];
        let y = array![0, 0, 1, 1];
        let mut model = DecisionTree::fit(TreeParams::default(), x.view(), y.view()).unwrap();
        model.feature_names = Some(vec!["Glucose".to_string()]);
        model.validate().unwrap();

        let refit = model.refit(x.view(), y.view()).unwrap();
        assert_eq!(refit.feature_names().unwrap(), ["Glucose".to_string()]);
        assert_eq!(refit.predict(array![[0.95]].view()).unwrap(), array![1]);
    }

    #[test]
    fn width_is_checked_before_prediction() {
        let x = array![[0.0, 1.0], [1.0, 0.0]];
        let model = DecisionTree::fit(TreeParams::default(), x.view(), array![0, 1].view()).unwrap();
        assert!(matches!(
            model.predict(array![[0.0]].view()),
            Err(ComputeError::ShapeMismatch { expected: 2, actual: 1 })
        ));
    }
}
