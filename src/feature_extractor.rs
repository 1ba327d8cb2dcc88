//! Feature extraction for yield model inference.
//!
//! The regressor was trained on a table whose column names and order are an
//! external contract. This module turns operating parameters into a single
//! named row in exactly that order.

use crate::error::InferenceError;
use crate::types::OperatingParameters;

/// Column names the stock regressor was trained on: pressure, flow, temperature
pub const DEFAULT_FEATURE_NAMES: [&str; 3] = ["PressureC1_diff", "FlowC1", "Temp1"];

/// One row of named model inputs, in the order the model expects
#[derive(Debug, Clone, PartialEq)]
pub struct InputRecord {
    columns: Vec<(String, f32)>,
}

impl InputRecord {
    /// Build a record from `(name, value)` pairs, keeping their order
    pub fn new(columns: Vec<(String, f32)>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[(String, f32)] {
        &self.columns
    }

    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn values(&self) -> Vec<f32> {
        self.columns.iter().map(|&(_, value)| value).collect()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Fail unless the column names match `expected` exactly, order included
    pub fn ensure_schema(&self, expected: &[String]) -> Result<(), InferenceError> {
        let matches = self.columns.len() == expected.len()
            && self
                .columns
                .iter()
                .zip(expected)
                .all(|((name, _), want)| name == want);

        if matches {
            Ok(())
        } else {
            Err(InferenceError::SchemaMismatch {
                expected: expected.to_vec(),
                actual: self.columns.iter().map(|(n, _)| n.clone()).collect(),
            })
        }
    }
}

/// Feature extractor that maps operating parameters onto the trained columns.
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    /// Column names for pressure, flow and temperature, in that order
    feature_names: [String; 3],
}

impl FeatureExtractor {
    /// Create an extractor using the stock column names
    pub fn new() -> Self {
        Self {
            feature_names: DEFAULT_FEATURE_NAMES.map(String::from),
        }
    }

    /// Create an extractor from configured column names.
    ///
    /// Returns `None` unless exactly three names are given.
    pub fn with_feature_names(names: &[String]) -> Option<Self> {
        let names: [String; 3] = names.to_vec().try_into().ok()?;
        Some(Self {
            feature_names: names,
        })
    }

    /// Extract the single input row for `params`
    pub fn extract(&self, params: &OperatingParameters) -> InputRecord {
        let [pressure, flow, temperature] = &self.feature_names;
        InputRecord::new(vec![
            (pressure.clone(), params.pressure_diff as f32),
            (flow.clone(), params.flow_rate as f32),
            (temperature.clone(), params.temperature as f32),
        ])
    }

    /// Get the number of features produced.
    pub fn feature_count(&self) -> usize {
        self.feature_names.len()
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new()
    }
}
