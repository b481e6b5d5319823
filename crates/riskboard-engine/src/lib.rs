//! riskboard-engine: model evaluation and fallback engine for the riskboard
//! clinical-risk dashboard.
//!
//! The crate turns a set of fitted binary classifiers and an evaluation
//! dataset into dashboard-ready analytics: performance metrics, confusion
//! matrices, learning curves, feature importances and risk-stratified
//! population statistics. Every real computation returns a `Result`; when it
//! fails (or when the model or data is missing) the caller-facing engine
//! substitutes bounded-random synthetic output instead of surfacing the error.
//!
//! Loading concerns (CSV datasets, JSON model files, configuration) live in
//! small modules of their own so the evaluation code only ever sees a
//! [`data_handling::Dataset`] and `dyn` [`models::Classifier`] objects.
pub mod catalog;
pub mod config;
pub mod data_handling;
pub mod engine;
pub mod error;
pub mod evaluation;
pub mod io;
pub mod models;
pub mod preprocessing;
pub mod random;
pub mod registry;
pub mod report;
pub mod risk;

pub use engine::ReportEngine;
pub use error::{ComputeError, DatasetError, EngineError};
