//! The predictor capability

use crate::error::InferenceError;
use crate::feature_extractor::InputRecord;
use std::sync::Arc;

/// A trained regressor, treated as an opaque capability.
///
/// Implementations are read-only after construction: the same record must
/// always produce the same values.
pub trait Predictor: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Column names the model was trained on, in order
    fn feature_names(&self) -> &[String];

    /// Run the model on one row and return its output sequence
    fn predict(&self, record: &InputRecord) -> Result<Vec<f64>, InferenceError>;
}

/// Loaded predictor handle, shared read-only for the life of the process
pub type SharedPredictor = Arc<dyn Predictor>;
