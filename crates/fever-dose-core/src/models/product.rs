//! Formulary product models.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Market a product is sold in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Market {
    Ko,
    En,
}

impl Market {
    pub fn as_str(&self) -> &'static str {
        match self {
            Market::Ko => "ko",
            Market::En => "en",
        }
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Market {
    type Err = crate::input::InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ko" => Ok(Market::Ko),
            "en" => Ok(Market::En),
            other => Err(crate::input::InputError::UnknownMarket(other.to_string())),
        }
    }
}

/// A liquid antipyretic product in the formulary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    /// Unique identifier
    pub id: String,
    /// Display name in the primary market language
    pub name: String,
    /// English display name
    #[serde(default, alias = "nameEn", skip_serializing_if = "Option::is_none")]
    pub name_en: Option<String>,
    /// Active ingredient (keys the daily volume cap rules)
    pub ingredient: String,
    /// English ingredient name
    #[serde(default, alias = "ingredientEn", skip_serializing_if = "Option::is_none")]
    pub ingredient_en: Option<String>,
    /// Markets the product is sold in
    pub markets: Vec<Market>,
    /// Concentration of active ingredient (mg per mL)
    pub strength_mg_per_ml: f64,
    /// Lower bound of a single dose (mg per kg body weight)
    pub min_dose_mg_per_kg: f64,
    /// Upper bound of a single dose (mg per kg body weight)
    pub max_dose_mg_per_kg: f64,
    /// Minimum patient age in months
    pub min_age_months: u32,
    /// Absolute ceiling on a single dose (mg)
    pub max_single_mg: f64,
    /// Ceiling on total daily intake (mg per kg body weight)
    pub max_daily_mg_per_kg: f64,
    /// Hours between doses
    pub interval_hours: f64,
    /// Maximum administrations per day
    pub max_doses_per_day: u32,
    /// Product image asset
    pub image: String,
    /// English product image asset
    #[serde(default, alias = "imageEn", skip_serializing_if = "Option::is_none")]
    pub image_en: Option<String>,
    /// FDA approval of the active ingredient, when known
    #[serde(default, alias = "fdaApproved", skip_serializing_if = "Option::is_none")]
    pub fda_approved: Option<bool>,
}

impl Product {
    /// Check if this product is sold in a given market.
    pub fn is_sold_in(&self, market: Market) -> bool {
        self.markets.contains(&market)
    }

    /// Name to display for a market, falling back to the primary name.
    pub fn display_name(&self, market: Market) -> &str {
        match (market, &self.name_en) {
            (Market::En, Some(name)) => name,
            _ => &self.name,
        }
    }

    /// Ingredient name to display for a market, falling back to the primary name.
    pub fn display_ingredient(&self, market: Market) -> &str {
        match (market, &self.ingredient_en) {
            (Market::En, Some(ingredient)) => ingredient,
            _ => &self.ingredient,
        }
    }
}
