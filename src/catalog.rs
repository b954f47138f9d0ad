//! Currency catalog
//!
//! Fixed registry of supported currencies and their sending limits. Loaded
//! once at startup and shared read-only afterwards.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

/// Amount pre-filled in the sending field when a controller starts
pub const DEFAULT_SENDING_AMOUNT: &str = "300";

/// A supported currency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    /// ISO 4217 code, unique within the catalog
    pub code: String,
    pub display_name: String,
    pub country_name: String,
    /// Maximum amount that may be sent in this currency
    pub sending_limit: Decimal,
}

impl Currency {
    pub fn new(
        code: impl Into<String>,
        display_name: impl Into<String>,
        country_name: impl Into<String>,
        sending_limit: Decimal,
    ) -> Self {
        Self {
            code: code.into(),
            display_name: display_name.into(),
            country_name: country_name.into(),
            sending_limit,
        }
    }
}

/// Errors raised while loading a catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Catalog is empty")]
    Empty,
    #[error("Catalog needs at least two currencies")]
    TooSmall,
    #[error("Invalid currency code: {0:?}")]
    InvalidCode(String),
    #[error("Duplicate currency code: {0}")]
    DuplicateCode(String),
    #[error("Sending limit for {0} must be positive")]
    NonPositiveLimit(String),
}

/// Ordered, immutable set of supported currencies
#[derive(Debug, Clone)]
pub struct CurrencyCatalog {
    currencies: Vec<Currency>,
    default_from: usize,
    default_to: usize,
}

impl CurrencyCatalog {
    /// Build a catalog from an ordered list.
    ///
    /// The first currency becomes the default sending currency and the last
    /// one the default receiving currency.
    pub fn new(currencies: Vec<Currency>) -> Result<Self, CatalogError> {
        if currencies.is_empty() {
            return Err(CatalogError::Empty);
        }
        if currencies.len() < 2 {
            return Err(CatalogError::TooSmall);
        }

        let mut seen = HashSet::new();
        for currency in &currencies {
            if !is_valid_code(&currency.code) {
                return Err(CatalogError::InvalidCode(currency.code.clone()));
            }
            if !seen.insert(currency.code.as_str()) {
                return Err(CatalogError::DuplicateCode(currency.code.clone()));
            }
            if currency.sending_limit <= Decimal::ZERO {
                return Err(CatalogError::NonPositiveLimit(currency.code.clone()));
            }
        }

        let default_to = currencies.len() - 1;
        Ok(Self {
            currencies,
            default_from: 0,
            default_to,
        })
    }

    /// Parse a JSON array of currencies
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let currencies: Vec<Currency> = serde_json::from_str(json)?;
        Self::new(currencies)
    }

    /// Load a catalog file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// All supported currencies, in display order
    pub fn list_supported(&self) -> &[Currency] {
        &self.currencies
    }

    pub fn by_code(&self, code: &str) -> Option<&Currency> {
        self.currencies.iter().find(|c| c.code == code)
    }

    pub fn default_from(&self) -> &Currency {
        &self.currencies[self.default_from]
    }

    pub fn default_to(&self) -> &Currency {
        &self.currencies[self.default_to]
    }
}

impl Default for CurrencyCatalog {
    fn default() -> Self {
        Self {
            currencies: builtin_currencies(),
            default_from: 0,
            default_to: 3,
        }
    }
}

fn builtin_currencies() -> Vec<Currency> {
    vec![
        Currency::new("PLN", "Polish Zloty", "Poland", dec!(20000)),
        Currency::new("EUR", "Euro", "Germany", dec!(5000)),
        Currency::new("GBP", "British Pound", "Great Britain", dec!(1000)),
        Currency::new("UAH", "Ukrainian Hryvnia", "Ukraine", dec!(50000)),
    ]
}

fn is_valid_code(code: &str) -> bool {
    code.len() == 3 && code.bytes().all(|b| b.is_ascii_uppercase())
}
