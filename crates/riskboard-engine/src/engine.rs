//! The caller-facing report engine.
//!
//! `ReportEngine` owns the catalog, the loaded models and the (optional)
//! evaluation dataset, and answers the three dashboard queries. Only an
//! unknown model id or a missing dataset is reported as an error; every
//! computation failure is absorbed into synthetic output.
use std::sync::Arc;

use rand::thread_rng;
use serde::Serialize;

use crate::catalog::{CatalogEntry, ModelCatalog};
use crate::config::EngineConfig;
use crate::data_handling::Dataset;
use crate::error::EngineError;
use crate::evaluation::confusion::calculate_confusion_matrix;
use crate::evaluation::feature_importance::feature_importance_for;
use crate::evaluation::learning_curve::calculate_learning_curve;
use crate::evaluation::metrics::{calculate_metrics, compute_accuracy};
use crate::evaluation::synthetic::{
    generate_confusion_matrix, generate_history, generate_learning_curve, generate_metrics,
};
use crate::evaluation::{
    ConfusionMatrix, Evaluated, FeatureImportance, HistorySeries, LearningCurve, MetricsReport,
    Provenance,
};
use crate::io::read_dataset_csv_with_config;
use crate::random::{uniform, RandomSource};
use crate::registry::ModelRegistry;
use crate::risk::{population_stats, PopulationStats};

/// Which branch produced each evaluated section of a [`ModelReport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReportSources {
    pub metrics: Provenance,
    pub confusion_matrix: Provenance,
    pub learning_curve: Provenance,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelReport {
    pub id: String,
    pub info: CatalogEntry,
    pub metrics: MetricsReport,
    pub confusion_matrix: ConfusionMatrix,
    pub learning_curve: LearningCurve,
    pub feature_importance: Option<FeatureImportance>,
    pub history: HistorySeries,
    pub sources: ReportSources,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub id: String,
    pub name: String,
    pub accuracy: f64,
    /// Synthetic inference latency in milliseconds.
    pub speed: f64,
}

#[derive(Debug)]
pub struct ReportEngine {
    config: EngineConfig,
    registry: ModelRegistry,
    dataset: Option<Arc<Dataset>>,
}

impl ReportEngine {
    pub fn new(config: EngineConfig, registry: ModelRegistry, dataset: Option<Dataset>) -> Self {
        if let Some(data) = &dataset {
            data.log_summary();
        }
        Self {
            config,
            registry,
            dataset: dataset.map(Arc::new),
        }
    }

    /// Load the configured dataset and model files. Either may be missing or
    /// broken; the engine then serves synthetic reports for what is absent.
    pub fn from_config(config: EngineConfig) -> Self {
        let dataset = config.dataset_path.as_ref().and_then(|path| {
            match read_dataset_csv_with_config(path, &config.reader_config()) {
                Ok(data) => Some(data),
                Err(err) => {
                    log::error!("Error loading data from {}: {:#}", path.display(), err);
                    None
                }
            }
        });
        if dataset.is_none() {
            log::warn!("No evaluation dataset loaded, reports will be synthetic");
        }
        let registry = ModelRegistry::load(&config);
        Self::new(config, registry, dataset)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn catalog(&self) -> &ModelCatalog {
        &self.config.catalog
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        self.dataset.as_deref()
    }

    pub fn list_models(&self) -> &ModelCatalog {
        self.catalog()
    }

    pub fn get_report(&self, model_id: &str) -> Result<ModelReport, EngineError> {
        self.get_report_with(model_id, &mut thread_rng())
    }

    pub fn get_report_with(
        &self,
        model_id: &str,
        rng: &mut dyn RandomSource,
    ) -> Result<ModelReport, EngineError> {
        let info = self
            .catalog()
            .get(model_id)
            .cloned()
            .ok_or_else(|| EngineError::ModelNotFound(model_id.to_string()))?;

        let history = generate_history(rng);

        let (metrics, confusion_matrix, learning_curve) =
            match (self.registry.get(model_id), &self.dataset) {
                (Some(model), Some(data)) => {
                    log::info!("Evaluating {} on {} records", model_id, data.n_records());
                    let metrics = calculate_metrics(Some(model.as_ref()), Some(data.as_ref()), rng);
                    let cm = calculate_confusion_matrix(Some(model.as_ref()), Some(data.as_ref()), rng);
                    let lc = calculate_learning_curve(
                        Some(model),
                        Some(data),
                        &self.config.learning_curve,
                        rng,
                    );
                    (metrics, cm, lc)
                }
                _ => {
                    log::info!("No model or data for {}, using synthetic report", model_id);
                    let mut metrics = generate_metrics(rng);
                    metrics.accuracy = info.accuracy;
                    (
                        Evaluated::synthetic(metrics),
                        Evaluated::synthetic(generate_confusion_matrix(rng)),
                        Evaluated::synthetic(generate_learning_curve(rng)),
                    )
                }
            };

        Ok(ModelReport {
            id: model_id.to_string(),
            info,
            sources: ReportSources {
                metrics: metrics.source,
                confusion_matrix: confusion_matrix.source,
                learning_curve: learning_curve.source,
            },
            metrics: metrics.value,
            confusion_matrix: confusion_matrix.value,
            learning_curve: learning_curve.value,
            feature_importance: feature_importance_for(&self.registry, model_id),
            history,
        })
    }

    pub fn get_comparison(&self) -> Vec<ComparisonRow> {
        self.get_comparison_with(&mut thread_rng())
    }

    /// One row per catalog entry, in catalog order.
    pub fn get_comparison_with(&self, rng: &mut dyn RandomSource) -> Vec<ComparisonRow> {
        self.catalog()
            .iter()
            .map(|entry| {
                let accuracy = self.real_accuracy(&entry.id).unwrap_or(entry.accuracy);
                ComparisonRow {
                    id: entry.id.clone(),
                    name: entry.name.clone(),
                    accuracy,
                    speed: uniform(rng, 10.0, 100.0),
                }
            })
            .collect()
    }

    fn real_accuracy(&self, model_id: &str) -> Option<f64> {
        let model = self.registry.get(model_id)?;
        let data = self.dataset.as_deref()?;
        match compute_accuracy(model.as_ref(), data) {
            Ok(accuracy) => Some(accuracy),
            Err(err) => {
                log::warn!("Error calculating accuracy for {}: {}", model_id, err);
                None
            }
        }
    }

    pub fn get_population_stats(&self) -> Result<PopulationStats, EngineError> {
        self.get_population_stats_with(&mut thread_rng())
    }

    pub fn get_population_stats_with(
        &self,
        rng: &mut dyn RandomSource,
    ) -> Result<PopulationStats, EngineError> {
        let data = self.dataset.as_deref().ok_or(EngineError::DataUnavailable)?;
        let model = self.registry.get(&self.config.risk_model_id);
        if model.is_none() {
            log::debug!("Risk model {} not loaded", self.config.risk_model_id);
        }
        Ok(population_stats(
            model.map(Arc::as_ref),
            data,
            &self.config.risk_thresholds,
            self.config.positive_label,
            rng,
        ))
    }
}
