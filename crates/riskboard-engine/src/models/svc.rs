use linfa::dataset::Pr;
use linfa::traits::{Fit, Predict};
use linfa::Dataset as LinfaDataset;
use linfa_svm::{Svm, SvmParams};
use ndarray::{Array1, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::error::ComputeError;
use crate::models::classifier_trait::{Capabilities, Capability, Classifier};
use crate::models::utils::{
    backend_error, check_training_set, check_width, default_classes, label_for, not_fitted,
    positive_mask, two_classes,
};

const NAME: &str = "svc";

/// Kernel used by the support vector machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SvcKernel {
    Linear,
    /// `exp(-|x - y|^2 / eps)`
    Gaussian { eps: f64 },
    Polynomial { constant: f64, degree: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SvcParams {
    /// Stopping tolerance of the SMO solver.
    pub eps: f64,
    /// Penalty weights for positive and negative samples.
    pub c: (f64, f64),
    pub kernel: SvcKernel,
}

impl Default for SvcParams {
    fn default() -> Self {
        Self {
            eps: 1e-3,
            c: (1.0, 1.0),
            kernel: SvcKernel::Gaussian { eps: 8.0 },
        }
    }
}

/// Support vector classifier backed by `linfa-svm`, with Platt-scaled
/// probabilities of the positive class.
///
/// Kernel SVMs expose no coefficients, so feature importance for this model
/// is always synthetic.
#[derive(Serialize, Deserialize)]
pub struct SupportVectorClassifier {
    #[serde(default)]
    pub params: SvcParams,
    #[serde(default)]
    pub feature_names: Option<Vec<String>>,
    #[serde(default = "default_classes")]
    pub classes: Vec<i64>,
    #[serde(default)]
    pub n_features: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    fitted: Option<Svm<f64, Pr>>,
}

impl SupportVectorClassifier {
    pub fn fit(
        params: SvcParams,
        x: ArrayView2<'_, f64>,
        y: ArrayView1<'_, i64>,
    ) -> Result<Self, ComputeError> {
        check_training_set(&x, &y)?;
        let classes = two_classes(&y)?;
        let dataset = LinfaDataset::new(x.to_owned(), positive_mask(&y, &classes));

        let (c_pos, c_neg) = params.c;
        let svm: SvmParams<f64, Pr> = Svm::<f64, Pr>::params()
            .eps(params.eps)
            .pos_neg_weights(c_pos, c_neg);
        let svm = match params.kernel {
            SvcKernel::Linear => svm.linear_kernel(),
            SvcKernel::Gaussian { eps } => svm.gaussian_kernel(eps),
            SvcKernel::Polynomial { constant, degree } => svm.polynomial_kernel(constant, degree),
        };
        let fitted = <SvmParams<f64, Pr> as Fit<_, _, _>>::fit(&svm, &dataset)
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
        if let SvcKernel::Gaussian { eps } = self.params.kernel {
            if eps <= 0.0 {
                return Err(ComputeError::InvalidParameter(format!(
                    "gaussian kernel eps must be positive, got {}",
                    eps
                )));
            }
        }
        Ok(())
    }

    fn fitted(&self) -> Result<&Svm<f64, Pr>, ComputeError> {
        self.fitted.as_ref().ok_or_else(|| not_fitted(NAME))
    }

    fn probabilities(&self, x: &ArrayView2<'_, f64>) -> Result<Array1<f64>, ComputeError> {
        let fitted = self.fitted()?;
        check_width(self.n_features, x)?;
        let probs: Array1<Pr> = fitted.predict(x);
        Ok(probs.mapv(|p| *p as f64))
    }
}

impl Classifier for SupportVectorClassifier {
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
        let mut fitted = SupportVectorClassifier::fit(self.params.clone(), x, y)?;
        fitted.feature_names = self.feature_names.clone();
        Ok(Box::new(fitted))
    }
}
