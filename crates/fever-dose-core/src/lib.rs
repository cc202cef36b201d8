//! Fever-Dose Core Library
//!
//! Weight-based dosing for pediatric liquid antipyretics.
//!
//! # Architecture
//!
//! ```text
//!  formulary.json ──► Formulary (schema validation) ──┐
//!                                                     │
//!  form input ──► RawDosageInput::validate ──► DosageInput
//!                                                     │
//!                                          ┌──────────▼──────────┐
//!                                          │   DosageCalculator  │
//!                                          │  age gate           │
//!                                          │  single-dose cap    │
//!                                          │  daily ceilings     │
//!                                          │  finiteness guard   │
//!                                          └──────────┬──────────┘
//!                                                     │
//!                                  Vec<DosageResult> (one per product)
//!                                                     │
//!                              ┌──────────────────────┼──────────────────┐
//!                              ▼                      ▼                  ▼
//!                       Result cards           WeightChart         FFI / CLI
//! ```
//!
//! # Core Principle
//!
//! **The engine never fails a batch.** Underage patients and broken
//! formulary entries come back as per-product statuses; every product in
//! the input yields exactly one result.
//!
//! # Modules
//!
//! - [`models`]: Domain types (Product, DosageInput, DosageResult)
//! - [`engine`]: Dose calculation and ingredient-keyed daily ceilings
//! - [`formulary`]: Formulary loading and schema validation
//! - [`input`]: Patient input validation
//! - [`chart`]: Weight chart and formulation grouping
//! - [`config`]: TOML configuration

pub mod chart;
pub mod config;
pub mod engine;
pub mod formulary;
pub mod input;
pub mod models;

// Re-export commonly used types
pub use chart::{group_by_formulation, ChartSpec, FormulationGroup, WeightChart};
pub use config::{Config, ConfigError};
pub use engine::{
    calculate_all_dosages, calculate_single_dosage, DailyCapTable, DailyVolumeCap,
    DosageCalculator,
};
pub use formulary::{Formulary, FormularyError, FormularyIssue};
pub use input::{InputError, InputLimits, RawDosageInput};
pub use models::{
    AgeUnit, DosageInput, DosageOutcome, DosageResult, DosageStatus, DoseVolumes, Market, Product,
};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::Arc;

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum FeverDoseError {
    #[error("Formulary error: {0}")]
    FormularyError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<FormularyError> for FeverDoseError {
    fn from(e: FormularyError) -> Self {
        match e {
            FormularyError::Invalid(issues) => FeverDoseError::FormularyError(
                issues
                    .iter()
                    .map(|i| i.to_string())
                    .collect::<Vec<_>>()
                    .join("; "),
            ),
            other => FeverDoseError::FormularyError(other.to_string()),
        }
    }
}

impl From<InputError> for FeverDoseError {
    fn from(e: InputError) -> Self {
        FeverDoseError::InvalidInput(e.to_string())
    }
}

impl From<serde_json::Error> for FeverDoseError {
    fn from(e: serde_json::Error) -> Self {
        FeverDoseError::SerializationError(e.to_string())
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open the formulary bundled with the library.
#[uniffi::export]
pub fn open_bundled_formulary() -> Result<Arc<FeverDoseCore>, FeverDoseError> {
    let formulary = Formulary::bundled()?;
    Ok(Arc::new(FeverDoseCore::new(formulary.clone())))
}

/// Open a formulary from a JSON array of products.
#[uniffi::export]
pub fn open_formulary_json(json: String) -> Result<Arc<FeverDoseCore>, FeverDoseError> {
    let formulary = Formulary::from_json(&json)?;
    Ok(Arc::new(FeverDoseCore::new(formulary)))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Read-only formulary handle shared across threads.
#[derive(uniffi::Object)]
pub struct FeverDoseCore {
    formulary: Arc<Formulary>,
    limits: InputLimits,
}

impl FeverDoseCore {
    fn new(formulary: Formulary) -> Self {
        Self {
            formulary: Arc::new(formulary),
            limits: InputLimits::default(),
        }
    }

    fn results_for(
        &self,
        weight: f64,
        age: u32,
        age_unit: String,
        market: Option<String>,
    ) -> Result<Vec<DosageResult>, FeverDoseError> {
        let raw = RawDosageInput {
            weight,
            age: age as f64,
            age_unit,
        };
        let input = raw.validate(&self.limits)?;

        let results = match market {
            Some(market) => {
                let market: Market = market.parse()?;
                calculate_all_dosages(&input, self.formulary.for_market(market).products())
            }
            None => calculate_all_dosages(&input, self.formulary.products()),
        };
        Ok(results)
    }
}

#[uniffi::export]
impl FeverDoseCore {
    /// Calculate dosing for every product, optionally filtered by market.
    pub fn calculate(
        &self,
        weight: f64,
        age: u32,
        age_unit: String,
        market: Option<String>,
    ) -> Result<Vec<FfiDosageResult>, FeverDoseError> {
        let results = self.results_for(weight, age, age_unit, market)?;
        Ok(results.into_iter().map(|r| r.into()).collect())
    }

    /// Calculate dosing and return the results as JSON.
    pub fn calculate_json(
        &self,
        weight: f64,
        age: u32,
        age_unit: String,
        market: Option<String>,
    ) -> Result<String, FeverDoseError> {
        let results = self.results_for(weight, age, age_unit, market)?;
        Ok(serde_json::to_string(&results)?)
    }

    /// Get a product by id.
    pub fn product(&self, id: String) -> Result<FfiProduct, FeverDoseError> {
        match self.formulary.get(&id) {
            Some(product) => Ok(product.clone().into()),
            None => Err(FeverDoseError::NotFound(match self.formulary.suggest(&id) {
                Some(close) => format!("{} (did you mean {}?)", id, close.id),
                None => id,
            })),
        }
    }

    /// Ids of every product, in formulary order.
    pub fn product_ids(&self) -> Vec<String> {
        self.formulary
            .products()
            .iter()
            .map(|p| p.id.clone())
            .collect()
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe dosage status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum FfiDosageStatus {
    Success,
    AgeBlock,
    Error,
}

impl From<DosageStatus> for FfiDosageStatus {
    fn from(status: DosageStatus) -> Self {
        match status {
            DosageStatus::Success => FfiDosageStatus::Success,
            DosageStatus::AgeBlock => FfiDosageStatus::AgeBlock,
            DosageStatus::Error => FfiDosageStatus::Error,
        }
    }
}

/// FFI-safe product.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiProduct {
    pub id: String,
    pub name: String,
    pub name_en: Option<String>,
    pub ingredient: String,
    pub ingredient_en: Option<String>,
    pub markets: Vec<String>,
    pub strength_mg_per_ml: f64,
    pub min_age_months: u32,
    pub interval_hours: f64,
    pub max_doses_per_day: u32,
    pub image: String,
    pub image_en: Option<String>,
}

impl From<Product> for FfiProduct {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            name: product.name,
            name_en: product.name_en,
            ingredient: product.ingredient,
            ingredient_en: product.ingredient_en,
            markets: product.markets.iter().map(|m| m.to_string()).collect(),
            strength_mg_per_ml: product.strength_mg_per_ml,
            min_age_months: product.min_age_months,
            interval_hours: product.interval_hours,
            max_doses_per_day: product.max_doses_per_day,
            image: product.image,
            image_en: product.image_en,
        }
    }
}

/// FFI-safe dosage result.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDosageResult {
    pub product: FfiProduct,
    pub status: FfiDosageStatus,
    pub min_ml: Option<f64>,
    pub max_ml: Option<f64>,
    pub max_single_ml: Option<f64>,
    pub max_daily_ml: Option<f64>,
    pub message: Option<String>,
}

impl From<DosageResult> for FfiDosageResult {
    fn from(result: DosageResult) -> Self {
        Self {
            status: result.status().into(),
            min_ml: result.min_ml(),
            max_ml: result.max_ml(),
            max_single_ml: result.max_single_ml(),
            max_daily_ml: result.max_daily_ml(),
            message: result.message().map(str::to_string),
            product: result.product.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calculate_through_ffi() {
        let core = open_bundled_formulary().unwrap();
        let results = core
            .calculate(20.0, 24, "months".into(), Some("ko".into()))
            .unwrap();

        assert_eq!(results.len(), 4);
        assert!(results.iter().all(|r| r.status == FfiDosageStatus::Success));

        let brufen = results
            .iter()
            .find(|r| r.product.id == "brufen_susp_100_5_kr")
            .unwrap();
        assert_eq!(brufen.max_daily_ml, Some(25.0));
    }

    #[test]
    fn test_ffi_age_block_fields_are_empty() {
        let core = open_bundled_formulary().unwrap();
        let results = core.calculate(7.0, 3, "months".into(), None).unwrap();

        let brufen = results
            .iter()
            .find(|r| r.product.id == "brufen_susp_100_5_kr")
            .unwrap();
        assert_eq!(brufen.status, FfiDosageStatus::AgeBlock);
        assert_eq!(brufen.min_ml, None);
        assert_eq!(brufen.max_daily_ml, None);
        assert!(brufen.message.is_some());
    }

    #[test]
    fn test_ffi_rejects_bad_input() {
        let core = open_bundled_formulary().unwrap();

        assert!(matches!(
            core.calculate(0.0, 12, "months".into(), None),
            Err(FeverDoseError::InvalidInput(_))
        ));
        assert!(matches!(
            core.calculate(10.0, 12, "weeks".into(), None),
            Err(FeverDoseError::InvalidInput(_))
        ));
        assert!(matches!(
            core.calculate(10.0, 12, "months".into(), Some("jp".into())),
            Err(FeverDoseError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_ffi_json_output() {
        let core = open_bundled_formulary().unwrap();
        let json = core
            .calculate_json(70.0, 3, "years".into(), Some("ko".into()))
            .unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let tylenol = &value[0];
        assert_eq!(tylenol["product"]["id"], "tylenol_susp_100ml_kr");
        assert_eq!(tylenol["status"], "success");
        assert_eq!(tylenol["max_ml"], 20.3);
        assert_eq!(tylenol["message"], "Capped to single-dose maximum.");
    }

    #[test]
    fn test_product_lookup_with_suggestion() {
        let core = open_bundled_formulary().unwrap();

        assert_eq!(core.product("champ_syrup_kr".into()).unwrap().name, "챔프 시럽");
        match core.product("champ_syrup".into()) {
            Err(FeverDoseError::NotFound(msg)) => assert!(msg.contains("champ_syrup_kr")),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_open_invalid_json_formulary() {
        assert!(matches!(
            open_formulary_json("[]x".into()),
            Err(FeverDoseError::FormularyError(_))
        ));
        assert_eq!(open_formulary_json("[]".into()).unwrap().product_ids().len(), 0);
    }
}
