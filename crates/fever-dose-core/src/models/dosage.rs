//! Dosage request and result models.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::Product;

/// Months in a year, used for age normalization.
pub const MONTHS_PER_YEAR: u32 = 12;

/// Unit the patient age is given in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AgeUnit {
    Months,
    Years,
}

impl AgeUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgeUnit::Months => "months",
            AgeUnit::Years => "years",
        }
    }
}

impl fmt::Display for AgeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgeUnit {
    type Err = crate::input::InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "months" | "month" => Ok(AgeUnit::Months),
            "years" | "year" => Ok(AgeUnit::Years),
            other => Err(crate::input::InputError::UnknownAgeUnit(other.to_string())),
        }
    }
}

/// A validated calculation request.
///
/// Construct through [`DosageInput::new`] or [`crate::input::RawDosageInput::validate`]
/// so weight and age have passed the sanity bounds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DosageInput {
    /// Body weight in kg
    pub weight: f64,
    /// Age, in `age_unit`
    pub age: u32,
    pub age_unit: AgeUnit,
}

impl DosageInput {
    /// Age normalized to months.
    pub fn age_in_months(&self) -> u32 {
        match self.age_unit {
            AgeUnit::Months => self.age,
            AgeUnit::Years => self.age.saturating_mul(MONTHS_PER_YEAR),
        }
    }
}

/// Outcome status of a per-product calculation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DosageStatus {
    Success,
    AgeBlock,
    Error,
}

impl DosageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DosageStatus::Success => "success",
            DosageStatus::AgeBlock => "age_block",
            DosageStatus::Error => "error",
        }
    }
}

impl fmt::Display for DosageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recommended volumes for a successful calculation, in mL rounded to one decimal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DoseVolumes {
    pub min_ml: f64,
    pub max_ml: f64,
    pub max_single_ml: f64,
    pub max_daily_ml: f64,
}

/// Per-product outcome. Volumes exist only on success.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DosageOutcome {
    Success {
        #[serde(flatten)]
        volumes: DoseVolumes,
        /// Set when the single dose was capped
        message: Option<String>,
    },
    AgeBlock {
        message: String,
    },
    Error {
        message: String,
    },
}

impl DosageOutcome {
    pub fn status(&self) -> DosageStatus {
        match self {
            DosageOutcome::Success { .. } => DosageStatus::Success,
            DosageOutcome::AgeBlock { .. } => DosageStatus::AgeBlock,
            DosageOutcome::Error { .. } => DosageStatus::Error,
        }
    }

    pub fn volumes(&self) -> Option<&DoseVolumes> {
        match self {
            DosageOutcome::Success { volumes, .. } => Some(volumes),
            _ => None,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            DosageOutcome::Success { message, .. } => message.as_deref(),
            DosageOutcome::AgeBlock { message } | DosageOutcome::Error { message } => {
                Some(message)
            }
        }
    }
}

/// Calculation result for one product.
///
/// Serializes flat, with every volume key present and `null` off success.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(into = "DosageRecord", try_from = "DosageRecord")]
pub struct DosageResult {
    pub product: Product,
    pub outcome: DosageOutcome,
}

/// Wire shape of [`DosageResult`].
#[derive(Serialize, Deserialize)]
struct DosageRecord {
    product: Product,
    status: DosageStatus,
    min_ml: Option<f64>,
    max_ml: Option<f64>,
    max_single_ml: Option<f64>,
    max_daily_ml: Option<f64>,
    message: Option<String>,
}

impl From<DosageResult> for DosageRecord {
    fn from(result: DosageResult) -> Self {
        let status = result.status();
        let volumes = result.outcome.volumes().copied();
        let message = match result.outcome {
            DosageOutcome::Success { message, .. } => message,
            DosageOutcome::AgeBlock { message } | DosageOutcome::Error { message } => {
                Some(message)
            }
        };
        Self {
            product: result.product,
            status,
            min_ml: volumes.map(|v| v.min_ml),
            max_ml: volumes.map(|v| v.max_ml),
            max_single_ml: volumes.map(|v| v.max_single_ml),
            max_daily_ml: volumes.map(|v| v.max_daily_ml),
            message,
        }
    }
}

impl TryFrom<DosageRecord> for DosageResult {
    type Error = String;

    fn try_from(record: DosageRecord) -> Result<Self, Self::Error> {
        let outcome = match record.status {
            DosageStatus::Success => {
                match (
                    record.min_ml,
                    record.max_ml,
                    record.max_single_ml,
                    record.max_daily_ml,
                ) {
                    (Some(min_ml), Some(max_ml), Some(max_single_ml), Some(max_daily_ml)) => {
                        DosageOutcome::Success {
                            volumes: DoseVolumes {
                                min_ml,
                                max_ml,
                                max_single_ml,
                                max_daily_ml,
                            },
                            message: record.message,
                        }
                    }
                    _ => return Err("success result is missing a volume".to_string()),
                }
            }
            DosageStatus::AgeBlock => DosageOutcome::AgeBlock {
                message: record
                    .message
                    .ok_or_else(|| "age_block result is missing a message".to_string())?,
            },
            DosageStatus::Error => DosageOutcome::Error {
                message: record
                    .message
                    .ok_or_else(|| "error result is missing a message".to_string())?,
            },
        };
        Ok(Self {
            product: record.product,
            outcome,
        })
    }
}

impl DosageResult {
    pub fn status(&self) -> DosageStatus {
        self.outcome.status()
    }

    pub fn is_success(&self) -> bool {
        self.status() == DosageStatus::Success
    }

    pub fn min_ml(&self) -> Option<f64> {
        self.outcome.volumes().map(|v| v.min_ml)
    }

    pub fn max_ml(&self) -> Option<f64> {
        self.outcome.volumes().map(|v| v.max_ml)
    }

    pub fn max_single_ml(&self) -> Option<f64> {
        self.outcome.volumes().map(|v| v.max_single_ml)
    }

    pub fn max_daily_ml(&self) -> Option<f64> {
        self.outcome.volumes().map(|v| v.max_daily_ml)
    }

    pub fn message(&self) -> Option<&str> {
        self.outcome.message()
    }
}
