//! Distillation Yield Predictor Library
//!
//! Loads a pre-trained regression model once per process and predicts the
//! product yield of a distillation column from three operating parameters.

pub mod config;
pub mod error;
pub mod feature_extractor;
pub mod metrics;
pub mod models;
pub mod types;
pub mod web;

pub use config::AppConfig;
pub use error::{InferenceError, LoadError};
pub use feature_extractor::{FeatureExtractor, InputRecord};
pub use metrics::PredictionMetrics;
pub use models::{InferenceEngine, ModelCache, Predictor, SharedPredictor};
pub use types::{OperatingParameters, PredictionOutcome, YieldPrediction};
