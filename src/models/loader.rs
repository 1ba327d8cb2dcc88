//! ONNX model loader

use crate::error::{InferenceError, LoadError};
use crate::feature_extractor::InputRecord;
use crate::models::predictor::Predictor;
use ort::session::{builder::GraphOptimizationLevel, Session, SessionInputValue};
use ort::value::Tensor;
use std::borrow::Cow;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// How the model takes its row of features
#[derive(Debug, Clone, PartialEq, Eq)]
enum InputLayout {
    /// One `[1, n]` float tensor, columns in schema order
    Matrix { input_name: String },
    /// One `[1, 1]` float tensor per named column
    Columns,
}

/// Regressor backed by an ONNX Runtime session
pub struct OnnxPredictor {
    /// Model name (file stem)
    name: String,
    /// ONNX Runtime session; running it needs exclusive access
    session: Mutex<Session>,
    /// Trained column names, in order
    feature_names: Vec<String>,
    layout: InputLayout,
    /// Output holding the predicted values
    output_name: String,
}

impl OnnxPredictor {
    fn run(&self, record: &InputRecord) -> Result<Vec<f64>, InferenceError> {
        let mut session = lock_unpoisoned(&self.session);

        let outputs = match &self.layout {
            InputLayout::Matrix { input_name } => {
                // Prepare input tensor - shape [1, num_features]
                let shape = vec![1_i64, record.len() as i64];
                let input_tensor = Tensor::from_array((shape, record.values()))?;
                session.run(ort::inputs![input_name.as_str() => input_tensor])?
            }
            InputLayout::Columns => {
                let mut inputs: Vec<(Cow<'_, str>, SessionInputValue<'_>)> =
                    Vec::with_capacity(record.len());
                for (name, value) in record.columns() {
                    let tensor = Tensor::from_array((vec![1_i64, 1], vec![*value]))?;
                    inputs.push((Cow::Owned(name.clone()), SessionInputValue::from(tensor)));
                }
                session.run(inputs)?
            }
        };

        let output = outputs.get(self.output_name.as_str()).ok_or_else(|| {
            InferenceError::Runtime(format!("model produced no output named {}", self.output_name))
        })?;

        // Regressors export either float or double outputs
        if let Ok((_, data)) = output.try_extract_tensor::<f32>() {
            return Ok(data.iter().map(|&v| v as f64).collect());
        }
        let (_, data) = output.try_extract_tensor::<f64>()?;
        Ok(data.to_vec())
    }
}

impl Predictor for OnnxPredictor {
    fn name(&self) -> &str {
        &self.name
    }

    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn predict(&self, record: &InputRecord) -> Result<Vec<f64>, InferenceError> {
        record.ensure_schema(&self.feature_names)?;
        let values = self.run(record)?;
        debug!(model = %self.name, values = ?values, "ONNX inference complete");
        Ok(values)
    }
}

/// Loader for ONNX regressors
#[derive(Debug, Clone)]
pub struct ModelLoader {
    /// Number of threads for ONNX inference
    onnx_threads: usize,
    /// Output to read predictions from; first output when `None`
    output_name: Option<String>,
}

impl ModelLoader {
    /// Create a new model loader with default settings (1 thread)
    pub fn new() -> Self {
        Self::with_threads(1)
    }

    /// Create a new model loader with specified number of threads
    pub fn with_threads(onnx_threads: usize) -> Self {
        Self {
            onnx_threads,
            output_name: None,
        }
    }

    /// Read predictions from the named output instead of the first one
    pub fn with_output_name(mut self, output_name: Option<String>) -> Self {
        self.output_name = output_name;
        self
    }

    /// Load a regressor from file.
    ///
    /// `feature_names` is the column schema the model was trained on. Models
    /// exported with one input per column carry their own schema instead.
    pub fn load<P: AsRef<Path>>(
        &self,
        path: P,
        feature_names: &[String],
    ) -> Result<OnnxPredictor, LoadError> {
        let path = path.as_ref();

        if !path.is_file() {
            return Err(LoadError::ArtifactMissing {
                path: path.to_path_buf(),
            });
        }

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "model".to_string());

        info!(model = %name, path = %path.display(), threads = self.onnx_threads, "Loading ONNX model");

        ort::init()
            .commit()
            .map_err(|e| LoadError::Runtime(e.to_string()))?;

        let corrupt = |reason: String| LoadError::ArtifactCorrupt {
            path: path.to_path_buf(),
            reason,
        };

        let session = Session::builder()
            .map_err(|e| LoadError::Runtime(e.to_string()))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| LoadError::Runtime(e.to_string()))?
            .with_intra_threads(self.onnx_threads)
            .map_err(|e| LoadError::Runtime(e.to_string()))?
            .commit_from_file(path)
            .map_err(|e| corrupt(e.to_string()))?;

        let input_names: Vec<String> = session.inputs.iter().map(|i| i.name.clone()).collect();
        let (layout, schema) = input_layout(&input_names, feature_names).map_err(corrupt)?;
        if layout == InputLayout::Columns && input_names.as_slice() != feature_names {
            warn!(
                model = %name,
                model_inputs = ?input_names,
                configured = ?feature_names,
                "Model input columns differ from configured feature names"
            );
        }

        let output_names: Vec<String> = session.outputs.iter().map(|o| o.name.clone()).collect();
        let output_name =
            select_output(&output_names, self.output_name.as_deref()).map_err(corrupt)?;

        info!(
            model = %name,
            layout = ?layout,
            features = ?schema,
            output = %output_name,
            "Model loaded successfully"
        );

        Ok(OnnxPredictor {
            name,
            session: Mutex::new(session),
            feature_names: schema,
            layout,
            output_name,
        })
    }
}

/// Lock a mutex even if an earlier holder panicked.
///
/// Sessions are never mutated by our code, so a panic mid-run leaves nothing
/// half-updated and the next user action can run the model again.
fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Pick how rows are fed to a model declaring `input_names`.
///
/// A single input takes the whole row in the configured order; one input per
/// column makes the model's own names the schema.
fn input_layout(
    input_names: &[String],
    feature_names: &[String],
) -> Result<(InputLayout, Vec<String>), String> {
    match input_names {
        [] => Err("model declares no inputs".to_string()),
        [single] => Ok((
            InputLayout::Matrix {
                input_name: single.clone(),
            },
            feature_names.to_vec(),
        )),
        _ => Ok((InputLayout::Columns, input_names.to_vec())),
    }
}

/// Pick the output predictions are read from: `wanted`, or the first one
fn select_output(output_names: &[String], wanted: Option<&str>) -> Result<String, String> {
    match wanted {
        Some(wanted) => output_names
            .iter()
            .find(|name| name.as_str() == wanted)
            .cloned()
            .ok_or_else(|| format!("model has no output named {}", wanted)),
        None => output_names
            .first()
            .cloned()
            .ok_or_else(|| "model declares no outputs".to_string()),
    }
}

impl Default for ModelLoader {
    fn default() -> Self {
        Self::new()
    }
}
