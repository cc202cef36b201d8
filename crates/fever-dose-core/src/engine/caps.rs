//! Ingredient-keyed daily volume ceilings.
//!
//! Some NSAID suspensions carry a fixed daily volume ceiling for light
//! children on top of the per-kg daily maximum. The rules are looked up by
//! ingredient name, never inferred from other product fields.

use serde::{Deserialize, Serialize};

use crate::models::Product;

/// Ingredient names carrying the NSAID light-child ceiling.
pub const NSAID_CAPPED_INGREDIENTS: &[&str] =
    &["이부프로펜", "덱시부프로펜", "ibuprofen", "dexibuprofen"];

/// Weight below which the NSAID ceiling applies (kg).
pub const NSAID_CAP_BELOW_WEIGHT_KG: f64 = 30.0;

/// NSAID daily volume ceiling (mL).
pub const NSAID_MAX_DAILY_ML: f64 = 25.0;

/// One daily volume ceiling rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyVolumeCap {
    /// Ingredient names the rule applies to (exact match, case-insensitive)
    pub ingredients: Vec<String>,
    /// Rule applies only when weight is strictly below this (kg)
    pub below_weight_kg: f64,
    /// Daily ceiling (mL)
    pub max_daily_ml: f64,
}

impl DailyVolumeCap {
    /// The ibuprofen/dexibuprofen rule: 25 mL/day under 30 kg.
    pub fn nsaid() -> Self {
        Self {
            ingredients: NSAID_CAPPED_INGREDIENTS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            below_weight_kg: NSAID_CAP_BELOW_WEIGHT_KG,
            max_daily_ml: NSAID_MAX_DAILY_ML,
        }
    }

    /// Check whether the rule covers an ingredient name.
    pub fn covers(&self, ingredient: &str) -> bool {
        let ingredient = ingredient.trim().to_lowercase();
        self.ingredients
            .iter()
            .any(|i| i.to_lowercase() == ingredient)
    }

    /// Check whether the rule applies to a product at a given weight.
    pub fn applies_to(&self, product: &Product, weight_kg: f64) -> bool {
        weight_kg < self.below_weight_kg && self.covers(&product.ingredient)
    }
}

/// Ordered set of daily volume ceiling rules.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyCapTable {
    rules: Vec<DailyVolumeCap>,
}

impl Default for DailyCapTable {
    fn default() -> Self {
        Self::new(vec![DailyVolumeCap::nsaid()])
    }
}

impl DailyCapTable {
    pub fn new(rules: Vec<DailyVolumeCap>) -> Self {
        Self { rules }
    }

    /// A table with no ceilings.
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn rules(&self) -> &[DailyVolumeCap] {
        &self.rules
    }

    /// Apply every matching rule to a daily volume; the lowest ceiling wins.
    ///
    /// A NaN input stays NaN so the finiteness guard still sees it.
    pub fn apply(&self, product: &Product, weight_kg: f64, max_daily_ml: f64) -> f64 {
        self.rules
            .iter()
            .filter(|rule| rule.applies_to(product, weight_kg))
            .fold(max_daily_ml, |acc, rule| {
                if rule.max_daily_ml < acc {
                    rule.max_daily_ml
                } else {
                    acc
                }
            })
    }
}
