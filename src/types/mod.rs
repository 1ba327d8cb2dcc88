//! Type definitions for the yield predictor

pub mod parameters;
pub mod prediction;

pub use parameters::{OperatingParameters, OutOfRange, ParameterRange};
pub use prediction::{PredictionOutcome, YieldPrediction};
