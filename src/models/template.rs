//! Product template model
//!
//! Templates are the catalog definitions of checkable products: the name,
//! default shelf life and the daily check periods a product must be
//! verified in. Templates are created by admins; records snapshot the
//! template data they need, so deleting a template never touches records.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A daily check window during which products must be verified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    /// Morning opening checks
    Opening,
    /// Midday shift transition checks
    Transition,
    /// Closing checks
    Closing,
}

impl Period {
    /// All periods, in daily order
    pub const ALL: [Period; 3] = [Period::Opening, Period::Transition, Period::Closing];
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Period::Opening => write!(f, "opening"),
            Period::Transition => write!(f, "transition"),
            Period::Closing => write!(f, "closing"),
        }
    }
}

impl FromStr for Period {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "opening" => Ok(Period::Opening),
            "transition" => Ok(Period::Transition),
            "closing" => Ok(Period::Closing),
            _ => Err(anyhow::anyhow!("Invalid period: {}", s)),
        }
    }
}

/// Product group for catalog organization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProductGroup {
    /// Fresh produce
    Fresh,
    /// Bread and bakery
    Bakery,
    /// Sauces
    Sauces,
    /// Toppings
    Toppings,
    /// Cafe products
    Cafe,
    /// Everything else
    #[default]
    Other,
}

impl fmt::Display for ProductGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProductGroup::Fresh => write!(f, "fresh"),
            ProductGroup::Bakery => write!(f, "bakery"),
            ProductGroup::Sauces => write!(f, "sauces"),
            ProductGroup::Toppings => write!(f, "toppings"),
            ProductGroup::Cafe => write!(f, "cafe"),
            ProductGroup::Other => write!(f, "other"),
        }
    }
}

impl FromStr for ProductGroup {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fresh" => Ok(ProductGroup::Fresh),
            "bakery" => Ok(ProductGroup::Bakery),
            "sauces" => Ok(ProductGroup::Sauces),
            "toppings" => Ok(ProductGroup::Toppings),
            "cafe" => Ok(ProductGroup::Cafe),
            "other" => Ok(ProductGroup::Other),
            _ => Err(anyhow::anyhow!("Invalid product group: {}", s)),
        }
    }
}

/// Catalog entry for a checkable product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductTemplate {
    /// Unique identifier
    pub id: String,
    /// Product name
    pub name: String,
    /// Reference to the product image
    pub image_url: String,
    /// Default shelf life in days, used to suggest an expiry date
    pub shelf_life_days: i64,
    /// Check periods this product applies to
    pub periods: Vec<Period>,
    /// Product group
    pub group: ProductGroup,
}

impl ProductTemplate {
    /// Whether this template must be checked during the given period
    pub fn applies_to(&self, period: Period) -> bool {
        self.periods.contains(&period)
    }

    /// Suggested expiry date for a product registered today
    pub fn suggested_expiry(&self, today: NaiveDate) -> NaiveDate {
        today + Duration::days(self.shelf_life_days)
    }
}

/// Input for creating a new template
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTemplateInput {
    /// Product name
    pub name: String,
    /// Reference to the product image
    #[serde(default)]
    pub image_url: String,
    /// Default shelf life in days
    pub shelf_life_days: i64,
    /// Check periods this product applies to
    pub periods: Vec<Period>,
    /// Product group
    #[serde(default)]
    pub group: ProductGroup,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(periods: Vec<Period>) -> ProductTemplate {
        ProductTemplate {
            id: "t1".to_string(),
            name: "Lettuce".to_string(),
            image_url: String::new(),
            shelf_life_days: 3,
            periods,
            group: ProductGroup::Fresh,
        }
    }

    #[test]
    fn test_applies_to() {
        let t = template(vec![Period::Opening, Period::Closing]);
        assert!(t.applies_to(Period::Opening));
        assert!(!t.applies_to(Period::Transition));
        assert!(t.applies_to(Period::Closing));
    }

    #[test]
    fn test_suggested_expiry_adds_shelf_life() {
        let t = template(vec![Period::Opening]);
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(
            t.suggested_expiry(today),
            NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()
        );
    }

    #[test]
    fn test_period_display_round_trip() {
        for p in Period::ALL {
            assert_eq!(Period::from_str(&p.to_string()).unwrap(), p);
        }
        assert!(Period::from_str("lunch").is_err());
    }

    #[test]
    fn test_product_group_from_str() {
        assert_eq!(ProductGroup::from_str("Bakery").unwrap(), ProductGroup::Bakery);
        assert_eq!(ProductGroup::from_str("cafe").unwrap(), ProductGroup::Cafe);
        assert!(ProductGroup::from_str("frozen").is_err());
    }
}
