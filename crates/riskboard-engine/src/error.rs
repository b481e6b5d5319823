use std::time::Duration;

use thiserror::Error;

use crate::models::Capability;

/// Failure of a real (non-synthetic) computation.
///
/// These never reach the caller of [`crate::ReportEngine`]: each call site
/// that receives one logs it and substitutes synthetic output.
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("classifier does not support {0}")]
    Unsupported(Capability),

    #[error("feature shape mismatch: model expects {expected} columns, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("length mismatch: {expected} expected, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("empty input: {0}")]
    EmptyInput(&'static str),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("cancelled")]
    Cancelled,

    #[error("worker failed: {0}")]
    Worker(String),

    #[error("model error: {0}")]
    Model(String),
}

/// Caller-visible failures: the requested resource does not exist.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Data not available")]
    DataUnavailable,
}

/// Invalid dataset construction.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DatasetError {
    #[error("feature matrix has {rows} rows but label vector has {labels}")]
    RowMismatch { rows: usize, labels: usize },

    #[error("feature matrix has {cols} columns but {names} feature names were given")]
    ColumnMismatch { cols: usize, names: usize },
}
