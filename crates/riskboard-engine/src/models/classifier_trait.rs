use std::fmt;

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use serde::Serialize;

use crate::error::ComputeError;

/// Optional things a classifier may be able to do beyond label prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    PredictProba,
    FeatureImportances,
    Coefficients,
    Refit,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Capability::PredictProba => "probability output",
            Capability::FeatureImportances => "feature importances",
            Capability::Coefficients => "coefficients",
            Capability::Refit => "refitting",
        };
        f.write_str(name)
    }
}

/// The capability set a classifier declares once, at load time.
///
/// Label prediction is mandatory and therefore not listed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    pub predict_proba: bool,
    pub feature_importances: bool,
    pub coefficients: bool,
    pub refit: bool,
}

impl Capabilities {
    pub const PREDICT_ONLY: Capabilities = Capabilities {
        predict_proba: false,
        feature_importances: false,
        coefficients: false,
        refit: false,
    };

    pub fn with(mut self, capability: Capability) -> Self {
        match capability {
            Capability::PredictProba => self.predict_proba = true,
            Capability::FeatureImportances => self.feature_importances = true,
            Capability::Coefficients => self.coefficients = true,
            Capability::Refit => self.refit = true,
        }
        self
    }

    pub fn supports(&self, capability: Capability) -> bool {
        match capability {
            Capability::PredictProba => self.predict_proba,
            Capability::FeatureImportances => self.feature_importances,
            Capability::Coefficients => self.coefficients,
            Capability::Refit => self.refit,
        }
    }
}

/// A fitted binary classifier.
///
/// Callers consult [`Classifier::capabilities`] before invoking any of the
/// optional methods; the default implementations report the capability as
/// unsupported.
pub trait Classifier: Send + Sync {
    /// Optional human readable name for the model
    fn name(&self) -> &str {
        "classifier"
    }

    fn capabilities(&self) -> Capabilities;

    /// Input feature names recorded at fit time, if any.
    fn feature_names(&self) -> Option<&[String]> {
        None
    }

    /// Predict a class label for every row of `x`.
    fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Array1<i64>, ComputeError>;

    /// Probability of the positive class for every row of `x`.
    fn predict_proba(&self, _x: ArrayView2<'_, f64>) -> Result<Array1<f64>, ComputeError> {
        Err(ComputeError::Unsupported(Capability::PredictProba))
    }

    /// Native per-feature importance weights.
    fn feature_importances(&self) -> Option<Array1<f64>> {
        None
    }

    /// Coefficient matrix; binary models hold a single row.
    fn coefficients(&self) -> Option<Array2<f64>> {
        None
    }

    /// Fit an unfitted copy of this model (same hyper-parameters) on `x`/`y`.
    fn refit(
        &self,
        _x: ArrayView2<'_, f64>,
        _y: ArrayView1<'_, i64>,
    ) -> Result<Box<dyn Classifier>, ComputeError> {
        Err(ComputeError::Unsupported(Capability::Refit))
    }
}
