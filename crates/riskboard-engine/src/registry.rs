//! Loaded classifiers keyed by model id.
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::EngineConfig;
use crate::models::factory::load_model_file;
use crate::models::Classifier;

#[derive(Clone, Default)]
pub struct ModelRegistry {
    models: HashMap<String, Arc<dyn Classifier>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every configured model file. Missing or unreadable files are
    /// logged and skipped; the engine reports synthetic data for those ids.
    pub fn load(config: &EngineConfig) -> Self {
        let mut registry = Self::new();
        log::info!("Loading models from {}", config.models_dir.display());
        let reader = config.reader_config();
        for (id, path) in config.model_paths() {
            if !path.exists() {
                log::warn!("Model file not found: {}", path.display());
                continue;
            }
            match load_model_file(&path, &reader) {
                Ok(model) => {
                    log::info!("Loaded {} ({})", id, model.name());
                    registry.insert(id, Arc::from(model));
                }
                Err(err) => log::error!("Error loading {}: {:#}", id, err),
            }
        }
        registry
    }

    pub fn insert(&mut self, id: impl Into<String>, model: Arc<dyn Classifier>) {
        self.models.insert(id.into(), model);
    }

    pub fn with_model(mut self, id: impl Into<String>, model: Arc<dyn Classifier>) -> Self {
        self.insert(id, model);
        self
    }

    pub fn get(&self, id: &str) -> Option<&Arc<dyn Classifier>> {
        self.models.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.models.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.models.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

impl std::fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelRegistry")
            .field("models", &self.ids())
            .finish()
    }
}
