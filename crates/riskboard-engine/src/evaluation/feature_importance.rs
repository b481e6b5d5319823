use serde::Serialize;

use crate::models::Classifier;
use crate::registry::ModelRegistry;

/// Per-feature contribution of a classifier, aligned `labels` / `values`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureImportance {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl FeatureImportance {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// `(label, value)` pairs ordered by decreasing value.
    pub fn ranked(&self) -> Vec<(&str, f64)> {
        let mut pairs: Vec<(&str, f64)> = self
            .labels
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
            .collect();
        pairs.sort_by(|a, b| b.1.total_cmp(&a.1));
        pairs
    }
}

fn feature_labels(model: &dyn Classifier, n: usize) -> Vec<String> {
    match model.feature_names() {
        Some(names) if names.len() == n => names.to_vec(),
        _ => (0..n).map(|i| format!("Feature {}", i)).collect(),
    }
}

/// Native importances when the classifier has them, otherwise the absolute
/// values of the first coefficient row. `None` when it exposes neither.
pub fn extract_feature_importance(model: &dyn Classifier) -> Option<FeatureImportance> {
    let caps = model.capabilities();

    let values: Vec<f64> = if caps.feature_importances {
        model.feature_importances()?.to_vec()
    } else if caps.coefficients {
        let coef = model.coefficients()?;
        if coef.nrows() == 0 {
            return None;
        }
        coef.row(0).iter().map(|c| c.abs()).collect()
    } else {
        log::debug!("{} exposes no feature importance", model.name());
        return None;
    };

    let labels = feature_labels(model, values.len());
    Some(FeatureImportance { labels, values })
}

/// Feature importance for a registered model id; `None` if the model is not
/// loaded or has neither capability.
pub fn feature_importance_for(registry: &ModelRegistry, model_id: &str) -> Option<FeatureImportance> {
    let model = registry.get(model_id)?;
    extract_feature_importance(model.as_ref())
}
