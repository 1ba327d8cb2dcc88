//! Configuration management for the yield predictor

use crate::feature_extractor::DEFAULT_FEATURE_NAMES;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default location of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

/// Prefix for environment overrides (`YIELD_PREDICTOR__MODEL__PATH`, ...)
const ENV_PREFIX: &str = "YIELD_PREDICTOR";

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Trained model configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Path of the serialized regressor, read once per process
    #[serde(default = "default_model_path")]
    pub path: PathBuf,
    /// Column names the regressor was trained on: pressure, flow, temperature
    #[serde(default = "default_feature_names")]
    pub feature_names: Vec<String>,
    /// Output to read the prediction from (first output when unset)
    #[serde(default)]
    pub output_name: Option<String>,
    /// Number of threads for ONNX inference (default: 1)
    #[serde(default = "default_onnx_threads")]
    pub onnx_threads: usize,
}

/// HTTP form server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Socket address the form is served on
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (json, pretty)
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_model_path() -> PathBuf {
    PathBuf::from("model.onnx")
}

fn default_feature_names() -> Vec<String> {
    DEFAULT_FEATURE_NAMES.map(String::from).to_vec()
}

fn default_onnx_threads() -> usize {
    1
}

fn default_bind_addr() -> String {
    "127.0.0.1:8501".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: default_model_path(),
            feature_names: default_feature_names(),
            output_name: None,
            onnx_threads: default_onnx_threads(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model: ModelConfig::default(),
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default file
    pub fn load() -> Result<Self> {
        Self::load_from_path(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from a specific path.
    ///
    /// The file is optional; environment variables override it.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()
            .context("Failed to build configuration")?;

        let config: Self = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the predictor cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.model.feature_names.len() != 3 {
            anyhow::bail!(
                "model.feature_names must name exactly 3 columns (pressure, flow, temperature), got {}",
                self.model.feature_names.len()
            );
        }
        if self.model.feature_names.iter().any(|n| n.trim().is_empty()) {
            anyhow::bail!("model.feature_names must not contain empty names");
        }
        if self.model.onnx_threads == 0 {
            anyhow::bail!("model.onnx_threads must be at least 1");
        }
        Ok(())
    }
}
