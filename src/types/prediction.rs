//! Prediction results

use crate::error::InferenceError;
use serde::Serialize;
use std::fmt;

/// Predicted product yield, as a percentage
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct YieldPrediction {
    pub percent: f64,
}

impl YieldPrediction {
    pub fn new(percent: f64) -> Self {
        Self { percent }
    }
}

impl fmt::Display for YieldPrediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}%", self.percent)
    }
}

/// Outcome of one user-triggered prediction
#[derive(Debug, Clone, PartialEq)]
pub enum PredictionOutcome {
    /// The model produced a value
    Predicted(YieldPrediction),
    /// The model was invoked and failed
    Failed(InferenceError),
    /// No model is loaded; nothing was invoked
    Unavailable(String),
}

impl PredictionOutcome {
    pub fn is_predicted(&self) -> bool {
        matches!(self, PredictionOutcome::Predicted(_))
    }

    /// Label used in logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            PredictionOutcome::Predicted(_) => "predicted",
            PredictionOutcome::Failed(_) => "failed",
            PredictionOutcome::Unavailable(_) => "unavailable",
        }
    }
}
