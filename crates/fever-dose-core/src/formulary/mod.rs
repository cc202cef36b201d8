//! Product formulary loading and validation.
//!
//! A [`Formulary`] only exists once every record has passed
//! [`validate_products`]; the engine takes its product slice as-is.

mod validate;

pub use validate::*;

use std::path::Path;

use once_cell::sync::Lazy;
use strsim::jaro_winkler;
use thiserror::Error;

use crate::models::{Market, Product};

/// Formulary shipped with the crate.
const BUNDLED_JSON: &str = include_str!("../../data/formulary.json");

/// Minimum similarity for an id suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.8;

static BUNDLED: Lazy<FormularyResult<Formulary>> = Lazy::new(|| Formulary::from_json(BUNDLED_JSON));

/// Formulary errors.
#[derive(Error, Debug)]
pub enum FormularyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Formulary validation failed with {} issue(s)", .0.len())]
    Invalid(Vec<FormularyIssue>),

    #[error("Bundled formulary unavailable: {0}")]
    Bundled(String),
}

pub type FormularyResult<T> = Result<T, FormularyError>;

/// A validated, read-only list of products.
#[derive(Debug, Clone, PartialEq)]
pub struct Formulary {
    products: Vec<Product>,
}

impl Formulary {
    /// Validate a product list.
    pub fn new(products: Vec<Product>) -> FormularyResult<Self> {
        let issues = validate_products(&products);
        if !issues.is_empty() {
            for issue in &issues {
                tracing::error!(%issue, "formulary entry rejected");
            }
            return Err(FormularyError::Invalid(issues));
        }
        tracing::debug!(count = products.len(), "formulary validated");
        Ok(Self { products })
    }

    /// Parse and validate a JSON array of products.
    pub fn from_json(json: &str) -> FormularyResult<Self> {
        let products: Vec<Product> = serde_json::from_str(json)?;
        Self::new(products)
    }

    /// Load and validate a JSON formulary file.
    pub fn load<P: AsRef<Path>>(path: P) -> FormularyResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let formulary = Self::from_json(&contents)?;
        tracing::info!(path = %path.display(), count = formulary.len(), "loaded formulary");
        Ok(formulary)
    }

    /// The built-in formulary, parsed once per process.
    pub fn bundled() -> FormularyResult<&'static Formulary> {
        Lazy::force(&BUNDLED)
            .as_ref()
            .map_err(|e| FormularyError::Bundled(e.to_string()))
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn into_products(self) -> Vec<Product> {
        self.products
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Get a product by id.
    pub fn get(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    /// Closest product id to a mistyped one, if any is similar enough.
    pub fn suggest(&self, id: &str) -> Option<&Product> {
        let query = id.to_lowercase();
        self.products
            .iter()
            .map(|p| (p, jaro_winkler(&query, &p.id.to_lowercase())))
            .filter(|(_, score)| *score >= SUGGESTION_THRESHOLD)
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(p, _)| p)
    }

    /// Products sold in a market, in formulary order.
    pub fn for_market(&self, market: Market) -> Formulary {
        Formulary {
            products: self
                .products
                .iter()
                .filter(|p| p.is_sold_in(market))
                .cloned()
                .collect(),
        }
    }
}
