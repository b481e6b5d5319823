//! Static model catalog: display metadata and baseline accuracy per model id.
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    /// Baseline accuracy fraction, used when no real evaluation is possible.
    pub accuracy: f64,
}

impl CatalogEntry {
    pub fn new(id: &str, name: &str, kind: &str, description: &str, accuracy: f64) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            kind: kind.to_string(),
            description: description.to_string(),
            accuracy,
        }
    }
}

/// Ordered list of catalog entries. Order is preserved in comparisons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelCatalog {
    entries: Vec<CatalogEntry>,
}

impl ModelCatalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    pub fn get(&self, id: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.id.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ModelCatalog {
    fn default() -> Self {
        Self::new(vec![
            CatalogEntry::new(
                "gradient_boosting",
                "Gradient Boosting",
                "Ensemble",
                "High-performance ensemble learning method combining multiple weak prediction models.",
                0.790,
            ),
            CatalogEntry::new(
                "random_forest",
                "Random Forest",
                "Ensemble",
                "Meta estimator that fits a number of decision tree classifiers on various sub-samples.",
                0.800,
            ),
            CatalogEntry::new(
                "svc",
                "Support Vector Classifier",
                "SVM",
                "Effective in high dimensional spaces, uses a subset of training points in the decision function.",
                0.705,
            ),
            CatalogEntry::new(
                "logistic_regression",
                "Logistic Regression",
                "Linear",
                "Statistical model that uses a logistic function to model a binary dependent variable.",
                0.755,
            ),
            CatalogEntry::new(
                "k_nearest_neighbors",
                "K-Nearest Neighbors",
                "Instance-based",
                "Non-parametric method used for classification and regression.",
                0.725,
            ),
        ])
    }
}
