//! Real and synthetic model evaluation.
//!
//! Each calculator has a `compute_*` function returning
//! `Result<T, ComputeError>` and a `calculate_*` wrapper that never fails: it
//! goes synthetic when the model or data is missing and substitutes synthetic
//! output when the real computation returns an error.
use serde::Serialize;

pub mod confusion;
pub mod feature_importance;
pub mod learning_curve;
pub mod metrics;
pub mod synthetic;

pub use confusion::ConfusionMatrix;
pub use feature_importance::FeatureImportance;
pub use learning_curve::LearningCurve;
pub use metrics::MetricsReport;
pub use synthetic::HistorySeries;

/// Which branch produced a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    Real,
    Synthetic,
}

/// A value together with the branch that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluated<T> {
    pub value: T,
    pub source: Provenance,
}

impl<T> Evaluated<T> {
    pub fn real(value: T) -> Self {
        Self {
            value,
            source: Provenance::Real,
        }
    }

    pub fn synthetic(value: T) -> Self {
        Self {
            value,
            source: Provenance::Synthetic,
        }
    }

    pub fn is_real(&self) -> bool {
        self.source == Provenance::Real
    }
}
