//! Patient input validation.
//!
//! Raw form values are checked here before a [`DosageInput`] reaches the
//! engine. The engine itself only guards against numeric degeneracy.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{AgeUnit, DosageInput};

/// Default upper sanity bound on body weight (kg).
pub const MAX_WEIGHT_KG: f64 = 100.0;

/// Input validation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InputError {
    #[error("Weight must be a number")]
    WeightNotFinite,

    #[error("Weight must be greater than zero (got {0})")]
    WeightNotPositive(f64),

    #[error("Implausible weight {weight} kg (maximum {max} kg)")]
    WeightTooHigh { weight: f64, max: f64 },

    #[error("Age must be a whole number (got {0})")]
    AgeNotInteger(f64),

    #[error("Age must be greater than zero")]
    AgeNotPositive,

    #[error("Age {0} is out of range")]
    AgeOutOfRange(f64),

    #[error("Age unit must be months or years (got {0:?})")]
    UnknownAgeUnit(String),

    #[error("Market must be ko or en (got {0:?})")]
    UnknownMarket(String),
}

pub type InputResult<T> = Result<T, InputError>;

/// Sanity bounds applied to user input.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct InputLimits {
    #[serde(default = "default_max_weight_kg")]
    pub max_weight_kg: f64,
}

impl Default for InputLimits {
    fn default() -> Self {
        Self {
            max_weight_kg: default_max_weight_kg(),
        }
    }
}

fn default_max_weight_kg() -> f64 {
    MAX_WEIGHT_KG
}

/// Unvalidated form input, as submitted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawDosageInput {
    pub weight: f64,
    pub age: f64,
    #[serde(alias = "ageUnit")]
    pub age_unit: String,
}

impl RawDosageInput {
    /// Validate against the given limits.
    pub fn validate(&self, limits: &InputLimits) -> InputResult<DosageInput> {
        let weight = validate_weight(self.weight, limits)?;

        if !self.age.is_finite() {
            return Err(InputError::AgeOutOfRange(self.age));
        }
        if self.age.fract() != 0.0 {
            return Err(InputError::AgeNotInteger(self.age));
        }
        if self.age <= 0.0 {
            return Err(InputError::AgeNotPositive);
        }
        if self.age > u32::MAX as f64 {
            return Err(InputError::AgeOutOfRange(self.age));
        }

        let age_unit: AgeUnit = self.age_unit.parse()?;

        Ok(DosageInput {
            weight,
            age: self.age as u32,
            age_unit,
        })
    }
}

impl DosageInput {
    /// Create a validated input with the default limits.
    pub fn new(weight: f64, age: u32, age_unit: AgeUnit) -> InputResult<Self> {
        Self::with_limits(weight, age, age_unit, &InputLimits::default())
    }

    /// Create a validated input with custom limits.
    pub fn with_limits(
        weight: f64,
        age: u32,
        age_unit: AgeUnit,
        limits: &InputLimits,
    ) -> InputResult<Self> {
        let weight = validate_weight(weight, limits)?;
        if age == 0 {
            return Err(InputError::AgeNotPositive);
        }
        Ok(Self {
            weight,
            age,
            age_unit,
        })
    }
}

fn validate_weight(weight: f64, limits: &InputLimits) -> InputResult<f64> {
    if !weight.is_finite() {
        return Err(InputError::WeightNotFinite);
    }
    if weight <= 0.0 {
        return Err(InputError::WeightNotPositive(weight));
    }
    if weight > limits.max_weight_kg {
        return Err(InputError::WeightTooHigh {
            weight,
            max: limits.max_weight_kg,
        });
    }
    Ok(weight)
}
