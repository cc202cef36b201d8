//! Per-product dose calculation.

use once_cell::sync::Lazy;

use super::caps::DailyCapTable;
use crate::models::{DosageInput, DosageOutcome, DosageResult, DoseVolumes, Product};

/// Decimal places kept on every mL figure.
pub const ML_ROUNDING_DECIMALS: i32 = 1;

/// Notice attached when the single dose hit the product ceiling.
pub const CAPPED_MESSAGE: &str = "Capped to single-dose maximum.";

/// Message for a product whose concentration is zero or negative.
pub const ZERO_STRENGTH_MESSAGE: &str = "Product data error (zero concentration).";

/// Message for a calculation that produced NaN or infinity.
pub const NON_FINITE_MESSAGE: &str = "Calculation error (non-finite value).";

static DEFAULT_CALCULATOR: Lazy<DosageCalculator> = Lazy::new(DosageCalculator::default);

/// Age-block advisory for a product minimum age.
pub fn age_block_message(min_age_months: u32) -> String {
    format!(
        "Children under {} months must consult a doctor before use.",
        min_age_months
    )
}

/// Round half away from zero to [`ML_ROUNDING_DECIMALS`] places.
pub(crate) fn round_ml(value: f64) -> f64 {
    let factor = 10f64.powi(ML_ROUNDING_DECIMALS);
    (value * factor).round() / factor
}

/// Dose calculator carrying the daily volume ceiling table.
///
/// Stateless apart from the rule table; one instance can serve any number of
/// threads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DosageCalculator {
    caps: DailyCapTable,
}

impl DosageCalculator {
    /// Create a calculator with a custom ceiling table.
    pub fn new(caps: DailyCapTable) -> Self {
        Self { caps }
    }

    /// Shared calculator with the default table.
    pub fn shared() -> &'static DosageCalculator {
        &DEFAULT_CALCULATOR
    }

    pub fn caps(&self) -> &DailyCapTable {
        &self.caps
    }

    /// Calculate results for every product, preserving input order.
    pub fn calculate_all(&self, input: &DosageInput, products: &[Product]) -> Vec<DosageResult> {
        let age_months = input.age_in_months();

        products
            .iter()
            .map(|product| DosageResult {
                product: product.clone(),
                outcome: self.calculate_single(input.weight, age_months, product),
            })
            .collect()
    }

    /// Calculate the outcome for one product.
    pub fn calculate_single(
        &self,
        weight_kg: f64,
        age_months: u32,
        product: &Product,
    ) -> DosageOutcome {
        // Age gate takes priority over every other check
        if age_months < product.min_age_months {
            tracing::debug!(
                product_id = %product.id,
                age_months,
                min_age_months = product.min_age_months,
                "age below product minimum"
            );
            return DosageOutcome::AgeBlock {
                message: age_block_message(product.min_age_months),
            };
        }

        // Also rejects NaN
        if !(product.strength_mg_per_ml > 0.0) {
            tracing::error!(
                product_id = %product.id,
                strength_mg_per_ml = product.strength_mg_per_ml,
                "product concentration is not positive"
            );
            return DosageOutcome::Error {
                message: ZERO_STRENGTH_MESSAGE.to_string(),
            };
        }

        let mut min_mg = weight_kg * product.min_dose_mg_per_kg;
        let mut max_mg = weight_kg * product.max_dose_mg_per_kg;
        let mut message = None;

        if max_mg > product.max_single_mg {
            max_mg = product.max_single_mg;
            message = Some(CAPPED_MESSAGE.to_string());
            tracing::debug!(product_id = %product.id, weight_kg, "single dose capped");
        }
        // Heavy patients can exceed the ceiling even at the per-kg minimum
        if min_mg > product.max_single_mg {
            min_mg = product.max_single_mg;
        }

        let strength = product.strength_mg_per_ml;
        let min_ml = min_mg / strength;
        let max_ml = max_mg / strength;
        let max_single_ml = product.max_single_mg / strength;

        let max_daily_mg = weight_kg * product.max_daily_mg_per_kg;
        let max_daily_ml = self.caps.apply(product, weight_kg, max_daily_mg / strength);

        if ![min_ml, max_ml, max_single_ml, max_daily_ml]
            .iter()
            .all(|v| v.is_finite())
        {
            tracing::error!(
                product_id = %product.id,
                weight_kg,
                min_ml,
                max_ml,
                max_single_ml,
                max_daily_ml,
                "dose calculation produced a non-finite value"
            );
            return DosageOutcome::Error {
                message: NON_FINITE_MESSAGE.to_string(),
            };
        }

        DosageOutcome::Success {
            volumes: DoseVolumes {
                min_ml: round_ml(min_ml),
                max_ml: round_ml(max_ml),
                max_single_ml: round_ml(max_single_ml),
                max_daily_ml: round_ml(max_daily_ml),
            },
            message,
        }
    }
}

/// Calculate results for every product with the default ceiling table.
pub fn calculate_all_dosages(input: &DosageInput, products: &[Product]) -> Vec<DosageResult> {
    DosageCalculator::shared().calculate_all(input, products)
}

/// Calculate the outcome for one product with the default ceiling table.
pub fn calculate_single_dosage(weight_kg: f64, age_months: u32, product: &Product) -> DosageOutcome {
    DosageCalculator::shared().calculate_single(weight_kg, age_months, product)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{fixtures, AgeUnit, DosageStatus};

    fn months(weight: f64, age: u32) -> DosageInput {
        DosageInput {
            weight,
            age,
            age_unit: AgeUnit::Months,
        }
    }

    fn volumes(outcome: &DosageOutcome) -> DoseVolumes {
        *outcome.volumes().expect("expected success")
    }

    #[test]
    fn test_round_ml_half_away_from_zero() {
        assert_eq!(round_ml(2.25), 2.3);
        assert_eq!(round_ml(10.75), 10.8);
        assert_eq!(round_ml(8.75), 8.8);
        assert_eq!(round_ml(0.125), 0.1);
        assert_eq!(round_ml(23.4375), 23.4);
        assert_eq!(round_ml(20.3125), 20.3);
        assert_eq!(round_ml(25.0), 25.0);
    }

    #[test]
    fn test_round_ml_is_stable_across_calls() {
        let first = round_ml(2.25);
        for _ in 0..100 {
            assert_eq!(round_ml(2.25), first);
        }
    }

    #[test]
    fn test_clean_success() {
        let outcome = calculate_single_dosage(10.0, 12, &fixtures::acetaminophen());

        // 100mg / 32 = 3.125, 150mg / 32 = 4.6875, 750mg / 32 = 23.4375
        let v = volumes(&outcome);
        assert_eq!(v.min_ml, 3.1);
        assert_eq!(v.max_ml, 4.7);
        assert_eq!(v.max_single_ml, 20.3);
        assert_eq!(v.max_daily_ml, 23.4);
        assert_eq!(outcome.message(), None);
    }

    #[test]
    fn test_heavy_patient_caps_both_ends() {
        let outcome = calculate_single_dosage(70.0, 36, &fixtures::acetaminophen());

        // 1050mg and 700mg both exceed 650mg
        let v = volumes(&outcome);
        assert_eq!(v.max_ml, 20.3);
        assert_eq!(v.min_ml, 20.3);
        assert_eq!(v.max_ml, v.max_single_ml);
        assert_eq!(outcome.message(), Some(CAPPED_MESSAGE));
    }

    #[test]
    fn test_cap_on_max_only() {
        let outcome = calculate_single_dosage(45.0, 120, &fixtures::acetaminophen());

        // 450mg stays, 675mg caps to 650mg
        let v = volumes(&outcome);
        assert_eq!(v.min_ml, 14.1);
        assert_eq!(v.max_ml, 20.3);
        assert_eq!(outcome.message(), Some(CAPPED_MESSAGE));
    }

    #[test]
    fn test_age_block() {
        let outcome = calculate_single_dosage(7.0, 3, &fixtures::ibuprofen());

        assert_eq!(outcome.status(), DosageStatus::AgeBlock);
        assert!(outcome.volumes().is_none());
        assert_eq!(
            outcome.message(),
            Some("Children under 6 months must consult a doctor before use.")
        );
    }

    #[test]
    fn test_age_at_minimum_is_allowed() {
        let outcome = calculate_single_dosage(7.0, 6, &fixtures::ibuprofen());
        assert_eq!(outcome.status(), DosageStatus::Success);
    }

    #[test]
    fn test_age_block_beats_bad_strength() {
        let mut product = fixtures::ibuprofen();
        product.strength_mg_per_ml = 0.0;

        let outcome = calculate_single_dosage(7.0, 3, &product);
        assert_eq!(outcome.status(), DosageStatus::AgeBlock);
    }

    #[test]
    fn test_zero_and_negative_strength() {
        for strength in [0.0, -5.0, f64::NAN] {
            let mut product = fixtures::acetaminophen();
            product.strength_mg_per_ml = strength;

            let outcome = calculate_single_dosage(10.0, 12, &product);
            assert_eq!(outcome.status(), DosageStatus::Error);
            assert!(outcome.volumes().is_none());
            assert_eq!(outcome.message(), Some(ZERO_STRENGTH_MESSAGE));
        }
    }

    #[test]
    fn test_non_finite_daily_maximum() {
        let mut product = fixtures::acetaminophen();
        product.max_daily_mg_per_kg = f64::INFINITY;

        let outcome = calculate_single_dosage(10.0, 12, &product);
        assert_eq!(outcome.status(), DosageStatus::Error);
        assert_eq!(outcome.message(), Some(NON_FINITE_MESSAGE));
    }

    #[test]
    fn test_nan_single_ceiling() {
        let mut product = fixtures::ibuprofen();
        product.max_single_mg = f64::NAN;

        let outcome = calculate_single_dosage(20.0, 24, &product);
        assert_eq!(outcome.status(), DosageStatus::Error);
        assert_eq!(outcome.message(), Some(NON_FINITE_MESSAGE));
    }

    #[test]
    fn test_ibuprofen_daily_cap_under_30kg() {
        let outcome = calculate_single_dosage(20.0, 24, &fixtures::ibuprofen());

        // 800mg / 20 = 40 mL, clamped to 25
        let v = volumes(&outcome);
        assert_eq!(v.max_daily_ml, 25.0);
        assert_eq!(v.min_ml, 5.0);
        assert_eq!(v.max_ml, 10.0);
        assert_eq!(outcome.message(), None);
    }

    #[test]
    fn test_dexibuprofen_daily_cap_under_30kg() {
        let outcome = calculate_single_dosage(20.0, 24, &fixtures::dexibuprofen());

        // 560mg / 12 = 46.7 mL, clamped to 25
        assert_eq!(volumes(&outcome).max_daily_ml, 25.0);
    }

    #[test]
    fn test_no_daily_cap_from_30kg() {
        let v = volumes(&calculate_single_dosage(30.0, 96, &fixtures::ibuprofen()));
        assert_eq!(v.max_daily_ml, 60.0);

        let v = volumes(&calculate_single_dosage(35.0, 120, &fixtures::ibuprofen()));
        assert_eq!(v.max_daily_ml, 70.0);
        // 175mg / 20 = 8.75
        assert_eq!(v.min_ml, 8.8);
    }

    #[test]
    fn test_daily_cap_keyed_by_ingredient_not_product() {
        let mut product = fixtures::acetaminophen();
        product.id = "brufen_lookalike".into();

        // 20kg x 75 / 32 = 46.875
        let v = volumes(&calculate_single_dosage(20.0, 24, &product));
        assert_eq!(v.max_daily_ml, 46.9);
    }

    #[test]
    fn test_custom_cap_table() {
        let calculator = DosageCalculator::new(DailyCapTable::empty());
        let outcome = calculator.calculate_single(20.0, 24, &fixtures::ibuprofen());
        assert_eq!(volumes(&outcome).max_daily_ml, 40.0);
    }

    #[test]
    fn test_rounding_boundary_through_engine() {
        let mut product = fixtures::acetaminophen();
        product.min_dose_mg_per_kg = 8.0;
        product.max_dose_mg_per_kg = 8.0;
        product.max_single_mg = 1000.0;

        // 9kg x 8 = 72mg / 32 = 2.25
        let v = volumes(&calculate_single_dosage(9.0, 12, &product));
        assert_eq!(v.min_ml, 2.3);

        // 43kg x 8 = 344mg / 32 = 10.75
        let v = volumes(&calculate_single_dosage(43.0, 120, &product));
        assert_eq!(v.max_ml, 10.8);
    }

    #[test]
    fn test_years_and_months_agree() {
        let products = vec![
            fixtures::acetaminophen(),
            fixtures::ibuprofen(),
            fixtures::dexibuprofen(),
        ];
        let years = DosageInput {
            weight: 15.0,
            age: 2,
            age_unit: AgeUnit::Years,
        };

        let by_years = calculate_all_dosages(&years, &products);
        let by_months = calculate_all_dosages(&months(15.0, 24), &products);
        assert_eq!(by_years, by_months);
    }

    #[test]
    fn test_batch_preserves_order_with_mixed_statuses() {
        let mut broken = fixtures::acetaminophen();
        broken.id = "broken".into();
        broken.strength_mg_per_ml = 0.0;

        let products = vec![
            fixtures::ibuprofen(),
            broken,
            fixtures::acetaminophen(),
            fixtures::dexibuprofen(),
        ];

        let results = calculate_all_dosages(&months(5.0, 5), &products);

        assert_eq!(results.len(), 4);
        let ids: Vec<&str> = results.iter().map(|r| r.product.id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["test_ibuprofen_20", "broken", "test_acetaminophen_32", "test_dexibuprofen_12"]
        );
        assert_eq!(results[0].status(), DosageStatus::AgeBlock);
        assert_eq!(results[1].status(), DosageStatus::Error);
        assert_eq!(results[2].status(), DosageStatus::Success);
        assert_eq!(results[3].status(), DosageStatus::AgeBlock);
    }

    #[test]
    fn test_inputs_are_not_mutated() {
        let products = vec![fixtures::acetaminophen(), fixtures::ibuprofen()];
        let snapshot = products.clone();

        let results = calculate_all_dosages(&months(70.0, 36), &products);
        assert_eq!(products, snapshot);
        assert_eq!(results[0].product, snapshot[0]);
    }

    #[test]
    fn test_empty_formulary() {
        assert!(calculate_all_dosages(&months(10.0, 12), &[]).is_empty());
    }
}
