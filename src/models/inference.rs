//! Prediction invoker for the yield regressor

use crate::config::AppConfig;
use crate::error::{InferenceError, LoadError};
use crate::feature_extractor::FeatureExtractor;
use crate::metrics::PredictionMetrics;
use crate::models::cache::ModelCache;
use crate::models::loader::ModelLoader;
use crate::models::predictor::SharedPredictor;
use crate::types::{OperatingParameters, PredictionOutcome, YieldPrediction};
use anyhow::{Context, Result};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Turns operating parameters into a yield prediction using the cached model
pub struct InferenceEngine {
    /// Process-lifetime model handle
    cache: Arc<ModelCache>,
    /// Maps parameters onto the trained columns
    extractor: FeatureExtractor,
    metrics: Arc<PredictionMetrics>,
}

impl InferenceEngine {
    /// Create a new inference engine from configuration.
    ///
    /// The model itself is loaded lazily by the first `warm_up` or `predict`.
    pub fn new(config: &AppConfig, metrics: Arc<PredictionMetrics>) -> Result<Self> {
        let extractor = FeatureExtractor::with_feature_names(&config.model.feature_names)
            .context("model.feature_names must name exactly 3 columns")?;

        let loader = ModelLoader::with_threads(config.model.onnx_threads)
            .with_output_name(config.model.output_name.clone());
        let cache = ModelCache::new(
            config.model.path.clone(),
            loader,
            config.model.feature_names.clone(),
        );

        info!(
            path = %config.model.path.display(),
            features = ?config.model.feature_names,
            "Inference engine initialized"
        );

        Ok(Self::with_cache(Arc::new(cache), extractor, metrics))
    }

    /// Create an inference engine around an existing model cache
    pub fn with_cache(
        cache: Arc<ModelCache>,
        extractor: FeatureExtractor,
        metrics: Arc<PredictionMetrics>,
    ) -> Self {
        Self {
            cache,
            extractor,
            metrics,
        }
    }

    /// Load the model now instead of on the first prediction
    pub fn warm_up(&self) -> Result<(), &LoadError> {
        self.cache.get().map(|_| ())
    }

    /// `Ok` when predictions can be made, otherwise why not
    pub fn availability(&self) -> Result<&SharedPredictor, &LoadError> {
        self.cache.get()
    }

    pub fn is_available(&self) -> bool {
        self.availability().is_ok()
    }

    pub fn metrics(&self) -> &Arc<PredictionMetrics> {
        &self.metrics
    }

    pub fn feature_extractor(&self) -> &FeatureExtractor {
        &self.extractor
    }

    /// Run one prediction.
    ///
    /// Never panics and never invokes the model when it is unavailable.
    pub fn predict(&self, params: &OperatingParameters) -> PredictionOutcome {
        let predictor = match self.cache.get() {
            Ok(predictor) => predictor,
            Err(e) => {
                self.metrics.record_unavailable();
                warn!(error = %e, "Prediction requested while model is unavailable");
                return PredictionOutcome::Unavailable(e.to_string());
            }
        };

        let record = self.extractor.extract(params);
        let start_time = Instant::now();

        let result = panic::catch_unwind(AssertUnwindSafe(|| predictor.predict(&record)))
            .unwrap_or_else(|payload| Err(InferenceError::Panicked(panic_message(payload))))
            .and_then(|values| values.first().copied().ok_or(InferenceError::EmptyOutput));

        let inference_time = start_time.elapsed();

        match result {
            Ok(percent) => {
                self.metrics.record_success(inference_time);
                debug!(
                    model = %predictor.name(),
                    pressure_diff = params.pressure_diff,
                    flow_rate = params.flow_rate,
                    temperature = params.temperature,
                    yield_percent = percent,
                    inference_time_us = inference_time.as_micros(),
                    "Prediction complete"
                );
                PredictionOutcome::Predicted(YieldPrediction::new(percent))
            }
            Err(e) => {
                self.metrics.record_failure(inference_time);
                error!(
                    model = %predictor.name(),
                    pressure_diff = params.pressure_diff,
                    flow_rate = params.flow_rate,
                    temperature = params.temperature,
                    error = %e,
                    "Prediction failed"
                );
                PredictionOutcome::Failed(e)
            }
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
