//! Weight chart and formulation grouping for result display.

use serde::{Deserialize, Serialize};

use crate::engine::DosageCalculator;
use crate::models::{AgeUnit, DosageInput, DosageResult, Product};

/// Grid of weights the chart is computed over.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ChartSpec {
    #[serde(default = "default_start_kg")]
    pub start_kg: f64,
    #[serde(default = "default_step_kg")]
    pub step_kg: f64,
    #[serde(default = "default_rows")]
    pub rows: usize,
    /// Fixed age used for every row, so most products pass the age gate
    #[serde(default = "default_age_months")]
    pub age_months: u32,
}

impl Default for ChartSpec {
    fn default() -> Self {
        Self {
            start_kg: default_start_kg(),
            step_kg: default_step_kg(),
            rows: default_rows(),
            age_months: default_age_months(),
        }
    }
}

fn default_start_kg() -> f64 {
    6.0
}

fn default_step_kg() -> f64 {
    2.0
}

fn default_rows() -> usize {
    18
}

fn default_age_months() -> u32 {
    24
}

impl ChartSpec {
    /// Weights for every row, in kg.
    pub fn weights(&self) -> Vec<f64> {
        (0..self.rows)
            .map(|i| self.start_kg + i as f64 * self.step_kg)
            .collect()
    }
}

/// One product's entry in a chart row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChartCell {
    pub product_id: String,
    /// Recommended range, absent when the product is blocked or failed
    pub min_ml: Option<f64>,
    pub max_ml: Option<f64>,
    /// The range top sits at the single-dose ceiling
    pub at_single_max: bool,
}

impl ChartCell {
    fn from_result(result: &DosageResult) -> Self {
        let at_single_max = match (result.max_ml(), result.max_single_ml()) {
            (Some(max), Some(ceiling)) => max == ceiling,
            _ => false,
        };
        Self {
            product_id: result.product.id.clone(),
            min_ml: result.min_ml(),
            max_ml: result.max_ml(),
            at_single_max,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChartRow {
    pub weight_kg: f64,
    pub cells: Vec<ChartCell>,
}

/// Precomputed dose table across a weight grid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeightChart {
    pub age_months: u32,
    pub product_ids: Vec<String>,
    pub rows: Vec<ChartRow>,
}

impl WeightChart {
    /// Run the engine once per grid weight.
    pub fn build(calculator: &DosageCalculator, products: &[Product], spec: &ChartSpec) -> Self {
        let rows = spec
            .weights()
            .into_iter()
            .map(|weight_kg| {
                let input = DosageInput {
                    weight: weight_kg,
                    age: spec.age_months,
                    age_unit: AgeUnit::Months,
                };
                let cells = calculator
                    .calculate_all(&input, products)
                    .iter()
                    .map(ChartCell::from_result)
                    .collect();
                ChartRow { weight_kg, cells }
            })
            .collect();

        Self {
            age_months: spec.age_months,
            product_ids: products.iter().map(|p| p.id.clone()).collect(),
            rows,
        }
    }
}

/// Results sharing an ingredient and concentration.
#[derive(Debug, Clone, PartialEq)]
pub struct FormulationGroup<'a> {
    pub ingredient: &'a str,
    pub strength_mg_per_ml: f64,
    pub results: Vec<&'a DosageResult>,
}

impl<'a> FormulationGroup<'a> {
    /// First result seen for this formulation.
    pub fn primary(&self) -> &'a DosageResult {
        self.results[0]
    }

    /// Results after the primary one.
    pub fn alternatives(&self) -> &[&'a DosageResult] {
        &self.results[1..]
    }
}

/// Group results by (ingredient, strength) in first-seen order.
pub fn group_by_formulation(results: &[DosageResult]) -> Vec<FormulationGroup<'_>> {
    let mut groups: Vec<FormulationGroup<'_>> = Vec::new();

    for result in results {
        let product = &result.product;
        match groups.iter_mut().find(|g| {
            g.ingredient == product.ingredient && g.strength_mg_per_ml == product.strength_mg_per_ml
        }) {
            Some(group) => group.results.push(result),
            None => groups.push(FormulationGroup {
                ingredient: &product.ingredient,
                strength_mg_per_ml: product.strength_mg_per_ml,
                results: vec![result],
            }),
        }
    }

    groups
}
