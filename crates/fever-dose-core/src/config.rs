//! Configuration file support.
//!
//! Every field is optional; a missing file or section falls back to the
//! built-in limits and rules.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::chart::ChartSpec;
use crate::engine::{DailyCapTable, DailyVolumeCap, DosageCalculator};
use crate::input::InputLimits;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Engine and front-end configuration.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub input: InputLimits,

    #[serde(default = "default_daily_caps")]
    pub daily_caps: Vec<DailyVolumeCap>,

    #[serde(default)]
    pub chart: ChartSpec,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input: InputLimits::default(),
            daily_caps: default_daily_caps(),
            chart: ChartSpec::default(),
        }
    }
}

fn default_daily_caps() -> Vec<DailyVolumeCap> {
    vec![DailyVolumeCap::nsaid()]
}

impl Config {
    /// Parse and validate TOML text.
    pub fn from_toml_str(contents: &str) -> ConfigResult<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents)?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Load from a path when given, otherwise use defaults.
    pub fn load_or_default(path: Option<&Path>) -> ConfigResult<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => {
                tracing::debug!("No config file given, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Reject values the engine cannot use.
    pub fn validate(&self) -> ConfigResult<()> {
        if !(self.input.max_weight_kg > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "input.max_weight_kg must be positive (got {})",
                self.input.max_weight_kg
            )));
        }

        for (i, cap) in self.daily_caps.iter().enumerate() {
            if cap.ingredients.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "daily_caps[{}] lists no ingredients",
                    i
                )));
            }
            if !(cap.max_daily_ml > 0.0) || !(cap.below_weight_kg > 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "daily_caps[{}] needs positive max_daily_ml and below_weight_kg",
                    i
                )));
            }
        }

        if self.chart.rows == 0 || !(self.chart.step_kg > 0.0) || !(self.chart.start_kg > 0.0) {
            return Err(ConfigError::Invalid(
                "chart needs at least one row and positive start_kg/step_kg".into(),
            ));
        }

        Ok(())
    }

    /// Build a calculator carrying the configured ceilings.
    pub fn calculator(&self) -> DosageCalculator {
        DosageCalculator::new(DailyCapTable::new(self.daily_caps.clone()))
    }
}
