use linfa::traits::Fit;
use linfa::Dataset as LinfaDataset;
use linfa_logistic::{FittedLogisticRegression, LogisticRegression as LinfaLogistic};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::ComputeError;
use crate::models::classifier_trait::{Capabilities, Capability, Classifier};
use crate::models::utils::{
    backend_error, check_training_set, check_width, default_classes, label_for, not_fitted,
    positive_mask, two_classes,
};

const NAME: &str = "logistic_regression";

/// Hyper-parameters passed to `linfa-logistic` on every (re)fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogisticParams {
    /// L2 penalty strength.
    pub alpha: f64,
    pub max_iterations: u64,
    pub gradient_tolerance: f64,
}

impl Default for LogisticParams {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            max_iterations: 100,
            gradient_tolerance: 1e-4,
        }
    }
}

/// L2-regularized logistic regression backed by `linfa-logistic`.
///
/// A model file either carries the serialized `fitted` state or leaves it
/// out and names `training_data` to fit from at load time.
#[derive(Serialize, Deserialize)]
pub struct LogisticRegression {
    #[serde(default)]
    pub params: LogisticParams,
    #[serde(default)]
    pub feature_names: Option<Vec<String>>,
    #[serde(default = "default_classes")]
    pub classes: Vec<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    fitted: Option<FittedLogisticRegression<f64, bool>>,
}

impl LogisticRegression {
    pub fn fit(
        params: LogisticParams,
        x: ArrayView2<'_, f64>,
        y: ArrayView1<'_, i64>,
    ) -> Result<Self, ComputeError> {
        check_training_set(&x, &y)?;
        let classes = two_classes(&y)?;
        let dataset = LinfaDataset::new(x.to_owned(), positive_mask(&y, &classes));

        let fitted = LinfaLogistic::default()
            .alpha(params.alpha)
            .max_iterations(params.max_iterations)
            .gradient_tolerance(params.gradient_tolerance)
            .fit(&dataset)
            .map_err(|e| backend_error(NAME, e))?;

        if fitted.params().iter().any(|v| !v.is_finite()) || !fitted.intercept().is_finite() {
            return Err(ComputeError::Model("logistic regression diverged".to_string()));
        }

        Ok(Self {
            params,
            feature_names: None,
            classes,
            fitted: Some(fitted),
        })
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    pub fn validate(&self) -> Result<(), ComputeError> {
        let fitted = self.fitted()?;
        if fitted.params().is_empty() {
            return Err(ComputeError::Model(
                "logistic regression has no coefficients".to_string(),
            ));
        }
        if self.classes.is_empty() {
            return Err(ComputeError::Model("no classes recorded".to_string()));
        }
        Ok(())
    }

    fn fitted(&self) -> Result<&FittedLogisticRegression<f64, bool>, ComputeError> {
        self.fitted.as_ref().ok_or_else(|| not_fitted(NAME))
    }

    /// Probability of `true` (our positive class) for every row.
    fn positive_probabilities(&self, x: &ArrayView2<'_, f64>) -> Result<Array1<f64>, ComputeError> {
        let fitted = self.fitted()?;
        check_width(fitted.params().len(), x)?;
        let probs = fitted.predict_probabilities(x);
        // linfa picks its own positive label
        if fitted.labels().pos.class {
            Ok(probs)
        } else {
            Ok(probs.mapv(|p| 1.0 - p))
        }
    }
}

impl Classifier for LogisticRegression {
    fn name(&self) -> &str {
        NAME
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::PREDICT_ONLY
            .with(Capability::PredictProba)
            .with(Capability::Coefficients)
            .with(Capability::Refit)
    }

    fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Array1<i64>, ComputeError> {
        let probs = self.positive_probabilities(&x)?;
        Ok(probs.mapv(|p| label_for(&self.classes, p >= 0.5)))
    }

    fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>, ComputeError> {
        self.positive_probabilities(&x)
    }

    fn coefficients(&self) -> Option<Array2<f64>> {
        let fitted = self.fitted.as_ref()?;
        Some(fitted.params().clone().insert_axis(Axis(0)))
    }

    fn refit(
        &self,
        x: ArrayView2<'_, f64>,
        y: ArrayView1<'_, i64>,
    ) -> Result<Box<dyn Classifier>, ComputeError> {
        let mut fitted = LogisticRegression::fit(self.params.clone(), x, y)?;
        fitted.feature_names = self.feature_names.clone();
        Ok(Box::new(fitted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn separates_a_linear_problem() {
        let x = array![[-2.0, 0.1], [-1.5, -0.2], [-1.0, 0.3], [1.0, 0.0], [1.5, 0.2], [2.0, -0.1]];
        let y = array![0, 0, 0, 1, 1, 1];
        let model = LogisticRegression::fit(LogisticParams::default(), x.view(), y.view()).unwrap();

        assert_eq!(model.predict(x.view()).unwrap(), y);
        let proba = model.predict_proba(x.view()).unwrap();
        assert!(proba[0] < 0.5 && proba[5] > 0.5);
        assert_eq!(model.coefficients().unwrap().dim(), (1, 2));
    }

    #[test]
    fn probabilities_follow_the_larger_label() {
        // labels 3 and 7: 7 is positive whatever order linfa assigns
        let x = array![[-2.0], [-1.0], [-1.5], [1.0], [2.0], [1.5]];
        let y = array![7, 7, 7, 3, 3, 3];
        let model = LogisticRegression::fit(LogisticParams::default(), x.view(), y.view()).unwrap();

        let proba = model.predict_proba(array![[-2.0], [2.0]].view()).unwrap();
        assert!(proba[0] > 0.5 && proba[1] < 0.5);
        assert_eq!(model.predict(array![[-2.0], [2.0]].view()).unwrap(), array![7, 3]);
    }

    #[test]
    fn wrong_width_is_a_shape_error() {
        let x = array![[1.0, 0.0, 0.5], [-1.0, 0.2, 0.1], [1.2, 0.1, 0.0], [-0.8, 0.0, 0.3]];
        let y = array![1, 0, 1, 0];
        let model = LogisticRegression::fit(LogisticParams::default(), x.view(), y.view()).unwrap();
        let err = model.predict(array![[1.0, 2.0]].view()).unwrap_err();
        assert!(matches!(err, ComputeError::ShapeMismatch { expected: 3, actual: 2 }));
    }

    #[test]
    fn single_class_training_set_is_rejected() {
        let x = array![[1.0], [2.0]];
        assert!(LogisticRegression::fit(LogisticParams::default(), x.view(), array![1, 1].view()).is_err());
    }

    #[test]
    fn unfitted_model_fails_validation() {
        let model: LogisticRegression = serde_json::from_str(r#"{"params": {"alpha": 0.5}}"#).unwrap();
        assert!(!model.is_fitted());
        assert!(model.validate().is_err());
        assert!(model.predict(array![[1.0]].view()).is_err());
    }
}
