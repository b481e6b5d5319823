use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::data_handling::Dataset;
use crate::error::ComputeError;
use crate::io::{read_dataset_csv_with_config, DatasetReaderConfig};
use crate::models::boosting::GradientBoosting;
use crate::models::classifier_trait::Classifier;
use crate::models::knn::KNearestNeighbors;
use crate::models::logistic::LogisticRegression;
use crate::models::svc::SupportVectorClassifier;
use crate::models::tree::DecisionTree;

/// A model and its hyper-parameters, tagged by `"type"`. Each variant
/// may carry its backend's serialized fitted state.
#[derive(Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModelSpec {
    LogisticRegression(LogisticRegression),
    Svc(SupportVectorClassifier),
    KNearestNeighbors(KNearestNeighbors),
    DecisionTree(DecisionTree),
    GradientBoosting(GradientBoosting),
}

impl ModelSpec {
    pub fn is_fitted(&self) -> bool {
        match self {
            ModelSpec::LogisticRegression(m) => m.is_fitted(),
            ModelSpec::Svc(m) => m.is_fitted(),
            ModelSpec::KNearestNeighbors(m) => m.is_fitted(),
            ModelSpec::DecisionTree(m) => m.is_fitted(),
            ModelSpec::GradientBoosting(m) => m.is_fitted(),
        }
    }

    /// Fit with this spec's hyper-parameters, recording the dataset's
    /// feature names on the result.
    pub fn fit(self, data: &Dataset) -> Result<ModelSpec, ComputeError> {
        let (x, y) = (data.x().view(), data.y().view());
        let names = Some(data.feature_names().to_vec());
        let spec = match self {
            ModelSpec::LogisticRegression(m) => {
                let mut fitted = LogisticRegression::fit(m.params, x, y)?;
                fitted.feature_names = names;
                ModelSpec::LogisticRegression(fitted)
            }
            ModelSpec::Svc(m) => {
                let mut fitted = SupportVectorClassifier::fit(m.params, x, y)?;
                fitted.feature_names = names;
                ModelSpec::Svc(fitted)
            }
            ModelSpec::KNearestNeighbors(m) => {
                let mut fitted = KNearestNeighbors::fit(m.k, x, y)?;
                fitted.feature_names = names;
                ModelSpec::KNearestNeighbors(fitted)
            }
            ModelSpec::DecisionTree(m) => {
                let mut fitted = DecisionTree::fit(m.params, x, y)?;
                fitted.feature_names = names;
                ModelSpec::DecisionTree(fitted)
            }
            ModelSpec::GradientBoosting(m) => {
                let mut fitted = GradientBoosting::fit(m.params, x, y)?;
                fitted.feature_names = names;
                ModelSpec::GradientBoosting(fitted)
            }
        };
        Ok(spec)
    }
}

/// Build a boxed classifier from a fitted `ModelSpec`, checking its parameters.
pub fn build_model(spec: ModelSpec) -> Result<Box<dyn Classifier>, ComputeError> {
    let model: Box<dyn Classifier> = match spec {
        ModelSpec::LogisticRegression(m) => {
            m.validate()?;
            Box::new(m)
        }
        ModelSpec::Svc(m) => {
            m.validate()?;
            Box::new(m)
        }
        ModelSpec::KNearestNeighbors(m) => {
            m.validate()?;
            Box::new(m)
        }
        ModelSpec::DecisionTree(m) => {
            m.validate()?;
            Box::new(m)
        }
        ModelSpec::GradientBoosting(m) => {
            m.validate()?;
            Box::new(m)
        }
    };
    Ok(model)
}

/// JSON model file: a [`ModelSpec`] plus, for specs without fitted state,
/// the labelled CSV to fit from. A relative `training_data` path is
/// resolved against the model file's directory.
#[derive(Serialize, Deserialize)]
pub struct ModelFile {
    #[serde(flatten)]
    pub model: ModelSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub training_data: Option<PathBuf>,
}

impl ModelFile {
    pub fn fitted(model: ModelSpec) -> Self {
        Self {
            model,
            training_data: None,
        }
    }
}

pub fn read_model_file<P: AsRef<Path>>(path: P) -> Result<ModelFile> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read model file: {}", path.display()))?;
    let file: ModelFile = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse model file: {}", path.display()))?;
    Ok(file)
}

/// Write a model file, fitted state included, as pretty JSON.
pub fn save_model_file<P: AsRef<Path>>(path: P, file: &ModelFile) -> Result<()> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(file)
        .with_context(|| format!("Failed to serialize model for {}", path.display()))?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write model file: {}", path.display()))?;
    log::info!("Saved model to {}", path.display());
    Ok(())
}

/// Read a JSON model file and build the classifier it describes, fitting
/// it first from `training_data` when the file holds no fitted state.
pub fn load_model_file<P: AsRef<Path>>(
    path: P,
    reader: &DatasetReaderConfig,
) -> Result<Box<dyn Classifier>> {
    let path = path.as_ref();
    let ModelFile {
        model,
        training_data,
    } = read_model_file(path)?;

    let model = if model.is_fitted() {
        model
    } else {
        let Some(training_data) = training_data else {
            bail!(
                "Model file {} has neither fitted state nor training_data",
                path.display()
            );
        };
        let training_path = match path.parent() {
            Some(dir) if training_data.is_relative() => dir.join(&training_data),
            _ => training_data,
        };
        let data = read_dataset_csv_with_config(&training_path, reader).with_context(|| {
            format!("Failed to load training data for {}", path.display())
        })?;
        log::info!(
            "Fitting {} on {} records from {}",
            path.display(),
            data.n_records(),
            training_path.display()
        );
        model
            .fit(&data)
            .with_context(|| format!("Failed to fit model from {}", path.display()))?
    };

    let model = build_model(model)
        .with_context(|| format!("Invalid model parameters in {}", path.display()))?;
    Ok(model)
}
