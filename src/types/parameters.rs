//! Operating parameters of the distillation column

use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared bounds of one operating parameter.
///
/// The range controls of the form are built from these, so anything inside
/// `[min, max]` reaches the model unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ParameterRange {
    pub min: i32,
    pub max: i32,
    pub step: i32,
    pub default: i32,
}

impl ParameterRange {
    /// Whether `value` lies inside the declared bounds (inclusive)
    pub fn contains(&self, value: i64) -> bool {
        value >= i64::from(self.min) && value <= i64::from(self.max)
    }
}

/// Pressure drop along the column (psi)
pub const PRESSURE_DIFF_RANGE: ParameterRange = ParameterRange {
    min: -50,
    max: 50,
    step: 1,
    default: 0,
};

/// Feed flow rate (m³/s)
pub const FLOW_RATE_RANGE: ParameterRange = ParameterRange {
    min: 100,
    max: 500,
    step: 1,
    default: 300,
};

/// Reboiler temperature (°C)
pub const TEMPERATURE_RANGE: ParameterRange = ParameterRange {
    min: 100,
    max: 200,
    step: 1,
    default: 130,
};

/// A parameter value fell outside its declared range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutOfRange {
    pub field: &'static str,
    pub value: i64,
    pub range: ParameterRange,
}

impl fmt::Display for OutOfRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} must be between {} and {}, got {}",
            self.field, self.range.min, self.range.max, self.value
        )
    }
}

impl std::error::Error for OutOfRange {}

/// The three operating parameters a prediction is made for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatingParameters {
    /// Pressure differential across the column (psi), may be negative
    pub pressure_diff: i32,
    /// Feed flow rate (m³/s)
    pub flow_rate: u32,
    /// Reboiler temperature (°C)
    pub temperature: u32,
}

impl OperatingParameters {
    pub fn new(pressure_diff: i32, flow_rate: u32, temperature: u32) -> Self {
        Self {
            pressure_diff,
            flow_rate,
            temperature,
        }
    }

    /// Build parameters from raw control values, rejecting anything the range
    /// controls could not have produced.
    pub fn from_controls(
        pressure_diff: i64,
        flow_rate: i64,
        temperature: i64,
    ) -> Result<Self, OutOfRange> {
        check("pressure_diff", pressure_diff, PRESSURE_DIFF_RANGE)?;
        check("flow_rate", flow_rate, FLOW_RATE_RANGE)?;
        check("temperature", temperature, TEMPERATURE_RANGE)?;

        // In range, so the narrowing casts are lossless
        Ok(Self::new(
            pressure_diff as i32,
            flow_rate as u32,
            temperature as u32,
        ))
    }

    /// Keep every in-range control value and fall back to the default for
    /// the rest, so a rejected submission redisplays what it can.
    pub fn from_controls_or_default(pressure_diff: i64, flow_rate: i64, temperature: i64) -> Self {
        let defaults = Self::default();
        Self::new(
            if PRESSURE_DIFF_RANGE.contains(pressure_diff) {
                pressure_diff as i32
            } else {
                defaults.pressure_diff
            },
            if FLOW_RATE_RANGE.contains(flow_rate) {
                flow_rate as u32
            } else {
                defaults.flow_rate
            },
            if TEMPERATURE_RANGE.contains(temperature) {
                temperature as u32
            } else {
                defaults.temperature
            },
        )
    }
}

fn check(field: &'static str, value: i64, range: ParameterRange) -> Result<(), OutOfRange> {
    if range.contains(value) {
        Ok(())
    } else {
        Err(OutOfRange {
            field,
            value,
            range,
        })
    }
}

impl Default for OperatingParameters {
    fn default() -> Self {
        Self::new(
            PRESSURE_DIFF_RANGE.default,
            FLOW_RATE_RANGE.default as u32,
            TEMPERATURE_RANGE.default as u32,
        )
    }
}
