//! Error types for model loading and inference

use std::path::PathBuf;
use thiserror::Error;

/// Why the trained model could not be loaded.
///
/// Every variant leaves the process running in degraded mode.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LoadError {
    #[error("model file not found at {}; make sure the model artifact is in the expected location", .path.display())]
    ArtifactMissing { path: PathBuf },

    #[error("model file at {} could not be deserialized: {reason}", .path.display())]
    ArtifactCorrupt { path: PathBuf, reason: String },

    #[error("inference runtime could not be initialized: {0}")]
    Runtime(String),
}

/// Why a single prediction failed.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum InferenceError {
    #[error("input columns {actual:?} do not match the trained schema {expected:?}")]
    SchemaMismatch {
        expected: Vec<String>,
        actual: Vec<String>,
    },

    #[error("model returned no values")]
    EmptyOutput,

    #[error("inference failed: {0}")]
    Runtime(String),

    #[error("model panicked during inference: {0}")]
    Panicked(String),
}

impl From<ort::Error> for InferenceError {
    fn from(e: ort::Error) -> Self {
        InferenceError::Runtime(e.to_string())
    }
}
