//! Process-lifetime model cache.
//!
//! Holds a single entry for the configured model path. The first `get`
//! loads the artifact; every later call returns the same handle, or the
//! same load error. There is no eviction and no invalidation: a broken or
//! missing artifact keeps the process in degraded mode until restart.

use crate::error::LoadError;
use crate::models::loader::ModelLoader;
use crate::models::predictor::SharedPredictor;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tracing::{info, warn};

type LoadFn = dyn Fn(&Path) -> Result<SharedPredictor, LoadError> + Send + Sync;

/// Single-entry, load-once cache for the predictor handle
pub struct ModelCache {
    path: PathBuf,
    loader: Box<LoadFn>,
    slot: OnceLock<Result<SharedPredictor, LoadError>>,
}

impl ModelCache {
    /// Cache an ONNX model at `path`, loaded with `loader` on first use
    pub fn new(path: impl Into<PathBuf>, loader: ModelLoader, feature_names: Vec<String>) -> Self {
        Self::with_loader(path, move |path| {
            let predictor = loader.load(path, &feature_names)?;
            Ok(Arc::new(predictor) as SharedPredictor)
        })
    }

    /// Cache whatever `load` produces for `path`
    pub fn with_loader<F>(path: impl Into<PathBuf>, load: F) -> Self
    where
        F: Fn(&Path) -> Result<SharedPredictor, LoadError> + Send + Sync + 'static,
    {
        Self {
            path: path.into(),
            loader: Box::new(load),
            slot: OnceLock::new(),
        }
    }

    /// Cache that already holds `predictor`
    pub fn preloaded(predictor: SharedPredictor) -> Self {
        let cache = Self::with_loader(PathBuf::new(), |path| {
            Err(LoadError::ArtifactMissing {
                path: path.to_path_buf(),
            })
        });
        let _ = cache.slot.set(Ok(predictor));
        cache
    }

    /// The predictor handle, loading it on first call
    pub fn get(&self) -> Result<&SharedPredictor, &LoadError> {
        self.slot.get_or_init(|| self.load()).as_ref()
    }

    /// Whether a load has been attempted (successfully or not)
    pub fn is_initialized(&self) -> bool {
        self.slot.get().is_some()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<SharedPredictor, LoadError> {
        match (self.loader)(&self.path) {
            Ok(predictor) => {
                info!(
                    path = %self.path.display(),
                    model = %predictor.name(),
                    "Model cached for the life of the process"
                );
                Ok(predictor)
            }
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Model could not be loaded, prediction disabled"
                );
                Err(e)
            }
        }
    }
}

impl fmt::Debug for ModelCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.slot.get() {
            None => "unloaded",
            Some(Ok(_)) => "loaded",
            Some(Err(_)) => "failed",
        };
        f.debug_struct("ModelCache")
            .field("path", &self.path)
            .field("state", &state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InferenceError;
    use crate::feature_extractor::InputRecord;
    use crate::models::predictor::Predictor;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ConstPredictor;

    impl Predictor for ConstPredictor {
        fn name(&self) -> &str {
            "const"
        }

        fn feature_names(&self) -> &[String] {
            &[]
        }

        fn predict(&self, _record: &InputRecord) -> Result<Vec<f64>, InferenceError> {
            Ok(vec![42.0])
        }
    }

    #[test]
    fn test_loads_once() {
        let loads = Arc::new(AtomicUsize::new(0));
        let counter = loads.clone();
        let cache = ModelCache::with_loader("model.onnx", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(ConstPredictor) as SharedPredictor)
        });

        assert!(!cache.is_initialized());
        let first = cache.get().unwrap().clone();
        let second = cache.get().unwrap().clone();

        assert!(cache.is_initialized());
        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_failure_is_cached_and_not_retried() {
        let loads = Arc::new(AtomicUsize::new(0));
        let counter = loads.clone();
        let cache = ModelCache::with_loader("missing.onnx", move |path| {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(LoadError::ArtifactMissing {
                path: path.to_path_buf(),
            })
        });

        for _ in 0..3 {
            assert_eq!(
                cache.get().err(),
                Some(&LoadError::ArtifactMissing {
                    path: PathBuf::from("missing.onnx")
                })
            );
        }
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_onnx_cache_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ModelCache::new(
            dir.path().join("model.onnx"),
            ModelLoader::new(),
            vec!["a".into(), "b".into(), "c".into()],
        );
        assert!(matches!(cache.get(), Err(LoadError::ArtifactMissing { .. })));
        assert!(format!("{:?}", cache).contains("failed"));
    }

    #[test]
    fn test_preloaded() {
        let cache = ModelCache::preloaded(Arc::new(ConstPredictor));
        assert!(cache.is_initialized());
        assert_eq!(cache.get().unwrap().name(), "const");
    }
}
