//! Formulary schema validation.
//!
//! Runs once at load time, before any product reaches the engine.

use std::collections::HashSet;
use std::fmt;

use thiserror::Error;

use crate::models::{Market, Product};

/// Permitted concentrations per ingredient (primary-market names).
pub const INGREDIENT_STRENGTHS: &[(&str, &[f64])] = &[
    ("아세트아미노펜", &[32.0, 50.0]),
    ("이부프로펜", &[20.0]),
    ("덱시부프로펜", &[12.0]),
];

/// Permitted concentrations per ingredient (English names).
pub const INGREDIENT_STRENGTHS_EN: &[(&str, &[f64])] = &[
    ("acetaminophen", &[32.0, 50.0]),
    ("ibuprofen", &[20.0]),
    ("dexibuprofen", &[12.0]),
];

/// What is wrong with a product record.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IssueKind {
    #[error("field `{0}` must not be empty")]
    EmptyField(&'static str),

    #[error("at least one market must be listed")]
    NoMarkets,

    #[error("field `{field}` must be greater than zero (got {value})")]
    NonPositive { field: &'static str, value: f64 },

    #[error("min_dose_mg_per_kg ({min}) exceeds max_dose_mg_per_kg ({max})")]
    InvertedDoseRange { min: f64, max: f64 },

    #[error("ingredient `{ingredient}` does not come in {strength} mg/mL")]
    StrengthMismatch { ingredient: String, strength: f64 },

    #[error("English market products must have name_en and ingredient_en")]
    MissingEnglishFields,

    #[error("FDA-unapproved ingredients cannot be in the English market")]
    UnapprovedInEnglishMarket,

    #[error("duplicate product id")]
    DuplicateId,
}

/// A validation problem tied to one formulary entry.
#[derive(Debug, Clone, PartialEq)]
pub struct FormularyIssue {
    /// Position in the formulary list
    pub index: usize,
    pub product_id: String,
    pub kind: IssueKind,
}

impl fmt::Display for FormularyIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "product #{} ({}): {}", self.index, self.product_id, self.kind)
    }
}

/// Validate every product; an empty result means the list is usable.
pub fn validate_products(products: &[Product]) -> Vec<FormularyIssue> {
    let mut issues = Vec::new();
    let mut seen_ids = HashSet::new();

    for (index, product) in products.iter().enumerate() {
        for kind in product_issues(product) {
            issues.push(FormularyIssue {
                index,
                product_id: product.id.clone(),
                kind,
            });
        }

        if !product.id.is_empty() && !seen_ids.insert(product.id.as_str()) {
            issues.push(FormularyIssue {
                index,
                product_id: product.id.clone(),
                kind: IssueKind::DuplicateId,
            });
        }
    }

    issues
}

/// Check a single product in isolation.
pub fn product_issues(product: &Product) -> Vec<IssueKind> {
    let mut issues = Vec::new();

    for (field, value) in [
        ("id", &product.id),
        ("name", &product.name),
        ("ingredient", &product.ingredient),
        ("image", &product.image),
    ] {
        if value.trim().is_empty() {
            issues.push(IssueKind::EmptyField(field));
        }
    }
    for (field, value) in [
        ("name_en", &product.name_en),
        ("ingredient_en", &product.ingredient_en),
        ("image_en", &product.image_en),
    ] {
        if matches!(value, Some(v) if v.trim().is_empty()) {
            issues.push(IssueKind::EmptyField(field));
        }
    }

    if product.markets.is_empty() {
        issues.push(IssueKind::NoMarkets);
    }

    for (field, value) in [
        ("strength_mg_per_ml", product.strength_mg_per_ml),
        ("min_dose_mg_per_kg", product.min_dose_mg_per_kg),
        ("max_dose_mg_per_kg", product.max_dose_mg_per_kg),
        ("max_single_mg", product.max_single_mg),
        ("max_daily_mg_per_kg", product.max_daily_mg_per_kg),
        ("interval_hours", product.interval_hours),
        ("max_doses_per_day", product.max_doses_per_day as f64),
    ] {
        if !(value > 0.0 && value.is_finite()) {
            issues.push(IssueKind::NonPositive { field, value });
        }
    }

    if product.min_dose_mg_per_kg > product.max_dose_mg_per_kg {
        issues.push(IssueKind::InvertedDoseRange {
            min: product.min_dose_mg_per_kg,
            max: product.max_dose_mg_per_kg,
        });
    }

    if !strength_matches(INGREDIENT_STRENGTHS, &product.ingredient, product.strength_mg_per_ml) {
        issues.push(IssueKind::StrengthMismatch {
            ingredient: product.ingredient.clone(),
            strength: product.strength_mg_per_ml,
        });
    }
    if let Some(ingredient_en) = &product.ingredient_en {
        if !strength_matches(INGREDIENT_STRENGTHS_EN, ingredient_en, product.strength_mg_per_ml) {
            issues.push(IssueKind::StrengthMismatch {
                ingredient: ingredient_en.clone(),
                strength: product.strength_mg_per_ml,
            });
        }
    }

    if product.is_sold_in(Market::En) {
        if product.name_en.is_none() || product.ingredient_en.is_none() {
            issues.push(IssueKind::MissingEnglishFields);
        }
        if product.fda_approved == Some(false) {
            issues.push(IssueKind::UnapprovedInEnglishMarket);
        }
    }

    issues
}

/// Unknown ingredients are not restricted.
fn strength_matches(table: &[(&str, &[f64])], ingredient: &str, strength: f64) -> bool {
    let key = ingredient.trim().to_lowercase();
    match table.iter().find(|(name, _)| *name == key) {
        Some((_, strengths)) => strengths.contains(&strength),
        None => true,
    }
}
