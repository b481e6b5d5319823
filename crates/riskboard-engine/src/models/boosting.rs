use gbdt::config::Config;
use gbdt::decision_tree::{Data, DataVec};
use gbdt::gradient_boost::GBDT;
use ndarray::{Array1, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::error::ComputeError;
use crate::models::classifier_trait::{Capabilities, Capability, Classifier};
use crate::models::utils::{
    check_training_set, check_width, default_classes, label_for, not_fitted, positive_mask,
    two_classes,
};

const NAME: &str = "gradient_boosting";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoostingParams {
    pub learning_rate: f32,
    pub max_depth: u32,
    pub iterations: usize,
    pub training_optimization_level: u8,
}

impl Default for BoostingParams {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            max_depth: 3,
            iterations: 50,
            training_optimization_level: 2,
        }
    }
}

/// Gradient boosted decision trees backed by `gbdt`, trained with the
/// log-likelihood loss so predictions are positive-class probabilities.
#[derive(Serialize, Deserialize)]
pub struct GradientBoosting {
    #[serde(default)]
    pub params: BoostingParams,
    #[serde(default)]
    pub feature_names: Option<Vec<String>>,
    #[serde(default = "default_classes")]
    pub classes: Vec<i64>,
    #[serde(default)]
    pub n_features: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    fitted: Option<GBDT>,
}

/// One `gbdt` sample per row. Labels are `+1`/`-1` as the log-likelihood
/// loss expects; prediction rows carry a dummy label.
fn to_data(x: &ArrayView2<'_, f64>, labels: Option<&Array1<bool>>) -> DataVec {
    x.rows()
        .into_iter()
        .enumerate()
        .map(|(i, row)| {
            let label = match labels {
                Some(l) if l[i] => 1.0,
                Some(_) => -1.0,
                None => 0.0,
            };
            let features = row.iter().map(|&v| v as f32).collect();
            Data::new_training_data(features, 1.0, label, None)
        })
        .collect()
}

impl GradientBoosting {
    pub fn fit(
        params: BoostingParams,
        x: ArrayView2<'_, f64>,
        y: ArrayView1<'_, i64>,
    ) -> Result<Self, ComputeError> {
        check_training_set(&x, &y)?;
        let classes = two_classes(&y)?;
        validate_params(&params)?;

        let mut config = Config::new();
        config.set_feature_size(x.ncols());
        config.set_shrinkage(params.learning_rate);
        config.set_max_depth(params.max_depth);
        config.set_iterations(params.iterations);
        config.set_debug(false);
        config.set_training_optimization_level(params.training_optimization_level);
        config.set_loss("LogLikelyhood");

        let mut gbdt = GBDT::new(&config);
        let mut train = to_data(&x, Some(&positive_mask(&y, &classes)));
        gbdt.fit(&mut train);

        Ok(Self {
            params,
            feature_names: None,
            classes,
            n_features: x.ncols(),
            fitted: Some(gbdt),
        })
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    pub fn validate(&self) -> Result<(), ComputeError> {
        self.fitted()?;
        validate_params(&self.params)?;
        if self.n_features == 0 {
            return Err(ComputeError::InvalidParameter(
                "n_features must be recorded with the fitted state".to_string(),
            ));
        }
        Ok(())
    }

    fn fitted(&self) -> Result<&GBDT, ComputeError> {
        self.fitted.as_ref().ok_or_else(|| not_fitted(NAME))
    }

    fn probabilities(&self, x: &ArrayView2<'_, f64>) -> Result<Array1<f64>, ComputeError> {
        let gbdt = self.fitted()?;
        check_width(self.n_features, x)?;
        if x.nrows() == 0 {
            return Ok(Array1::zeros(0));
        }
        let predicted = gbdt.predict(&to_data(x, None));
        Ok(predicted
            .into_iter()
            .map(|p| (p as f64).clamp(0.0, 1.0))
            .collect())
    }
}

fn validate_params(params: &BoostingParams) -> Result<(), ComputeError> {
    if params.iterations == 0 {
        return Err(ComputeError::InvalidParameter("iterations must be at least 1".to_string()));
    }
    if params.max_depth == 0 {
        return Err(ComputeError::InvalidParameter("max_depth must be at least 1".to_string()));
    }
    if params.learning_rate.is_nan() || params.learning_rate <= 0.0 {
        return Err(ComputeError::InvalidParameter(format!(
            "learning_rate must be positive, got {}",
            params.learning_rate
        )));
    }
    Ok(())
}

impl Classifier for GradientBoosting {
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
        let probs = self.probabilities(&x)?;
        Ok(probs.mapv(|p| label_for(&self.classes, p >= 0.5)))
    }

    fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>, ComputeError> {
        self.probabilities(&x)
    }

    fn refit(
        &self,
        x: ArrayView2<'_, f64>,
        y: ArrayView1<'_, i64>,
    ) -> Result<Box<dyn Classifier>, ComputeError> {
        let mut fitted = GradientBoosting::fit(self.params.clone(), x, y)?;
        fitted.feature_names = self.feature_names.clone();
        Ok(Box::new(fitted))
    }
}
