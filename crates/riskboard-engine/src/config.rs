use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};

use crate::catalog::ModelCatalog;
use crate::io::DatasetReaderConfig;

/// Probability cut points for the Low / Medium / High risk tiers.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct RiskThresholds {
    /// Probabilities below this are Low.
    pub medium: f64,
    /// Probabilities at or above this are High.
    pub high: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            medium: 0.3,
            high: 0.7,
        }
    }
}

/// Cross-validated learning curve settings.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct LearningCurveConfig {
    pub folds: usize,
    pub points: usize,
    pub min_fraction: f64,
    pub max_fraction: f64,
    /// Wall-clock budget for the real computation; `None` waits indefinitely.
    pub timeout_ms: Option<u64>,
}

impl Default for LearningCurveConfig {
    fn default() -> Self {
        Self {
            folds: 3,
            points: 5,
            min_fraction: 0.1,
            max_fraction: 1.0,
            timeout_ms: Some(30_000),
        }
    }
}

/// Engine configuration, loaded from JSON.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct EngineConfig {
    /// CSV evaluation dataset; without it every report is synthetic.
    pub dataset_path: Option<PathBuf>,
    pub label_column: String,
    pub scale_features: bool,
    pub models_dir: PathBuf,
    /// Model id -> JSON model file, relative to `models_dir`.
    pub model_files: BTreeMap<String, PathBuf>,
    /// Model used for population risk stratification.
    pub risk_model_id: String,
    pub positive_label: i64,
    pub risk_thresholds: RiskThresholds,
    pub learning_curve: LearningCurveConfig,
    pub catalog: ModelCatalog,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let model_files = [
            "gradient_boosting",
            "random_forest",
            "svc",
            "logistic_regression",
            "k_nearest_neighbors",
        ]
        .into_iter()
        .map(|id| (id.to_string(), PathBuf::from(format!("{}.json", id))))
        .collect();

        Self {
            dataset_path: None,
            label_column: "Outcome".to_string(),
            scale_features: true,
            models_dir: PathBuf::from("."),
            model_files,
            risk_model_id: "random_forest".to_string(),
            positive_label: 1,
            risk_thresholds: RiskThresholds::default(),
            learning_curve: LearningCurveConfig::default(),
            catalog: ModelCatalog::default(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        let t = &self.risk_thresholds;
        ensure!(
            (0.0..=1.0).contains(&t.medium) && (0.0..=1.0).contains(&t.high) && t.medium <= t.high,
            "risk thresholds must satisfy 0 <= medium <= high <= 1, got {} / {}",
            t.medium,
            t.high
        );

        let lc = &self.learning_curve;
        ensure!(lc.folds >= 2, "learning_curve.folds must be at least 2");
        ensure!(lc.points >= 1, "learning_curve.points must be at least 1");
        ensure!(
            lc.min_fraction > 0.0 && lc.min_fraction <= lc.max_fraction && lc.max_fraction <= 1.0,
            "learning curve fractions must satisfy 0 < min <= max <= 1, got {} / {}",
            lc.min_fraction,
            lc.max_fraction
        );
        ensure!(!self.label_column.is_empty(), "label_column must not be empty");
        Ok(())
    }

    /// CSV reader settings shared by the evaluation dataset and any
    /// `training_data` a model file points at.
    pub fn reader_config(&self) -> DatasetReaderConfig {
        DatasetReaderConfig {
            label_column: self.label_column.clone(),
            scale_features: self.scale_features,
            ..DatasetReaderConfig::default()
        }
    }

    /// Resolved on-disk path for each configured model file.
    pub fn model_paths(&self) -> impl Iterator<Item = (&str, PathBuf)> + '_ {
        self.model_files
            .iter()
            .map(move |(id, file)| (id.as_str(), self.models_dir.join(file)))
    }
}

/// Load an engine configuration from a JSON file.
pub fn load_engine_config<P: AsRef<Path>>(path: P) -> Result<EngineConfig> {
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config: {}", path.as_ref().display()))?;
    let config: EngineConfig = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config: {}", path.as_ref().display()))?;
    config
        .validate()
        .with_context(|| format!("Invalid config: {}", path.as_ref().display()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = EngineConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.learning_curve.folds, 3);
        assert_eq!(cfg.risk_model_id, "random_forest");
        assert_eq!(cfg.model_files.len(), 5);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg: EngineConfig =
            serde_json::from_str(r#"{"label_column": "Label", "risk_thresholds": {"high": 0.8}}"#)
                .unwrap();
        assert_eq!(cfg.label_column, "Label");
        assert_eq!(cfg.risk_thresholds.medium, 0.3);
        assert_eq!(cfg.risk_thresholds.high, 0.8);
        assert_eq!(cfg.catalog.len(), 5);
    }

    #[test]
    fn inverted_thresholds_are_rejected() {
        let mut cfg = EngineConfig::default();
        cfg.risk_thresholds = RiskThresholds { medium: 0.8, high: 0.2 };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn model_paths_join_models_dir() {
        let mut cfg = EngineConfig::default();
        cfg.models_dir = PathBuf::from("/srv/models");
        let paths: Vec<_> = cfg.model_paths().collect();
        assert!(paths.contains(&("svc", PathBuf::from("/srv/models/svc.json"))));
    }
}
