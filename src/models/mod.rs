//! Model loading, caching and inference

pub mod cache;
pub mod inference;
pub mod loader;
pub mod predictor;

pub use cache::ModelCache;
pub use inference::InferenceEngine;
pub use loader::{ModelLoader, OnnxPredictor};
pub use predictor::{Predictor, SharedPredictor};
