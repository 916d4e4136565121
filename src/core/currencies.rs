//! Currencies supported by a run, with their credit-note numbering index.
//!
//! The index appears in every generated credit note number
//! (`S25001-0042` is EUR, `S25011-0042` is USD), so it is fixed per
//! currency and never derived from input order.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::ValidationError;

/// Largest scale a [`Decimal`] can carry.
const MAX_MINOR_DIGITS: u32 = 28;

/// One supported currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    /// ISO 4217 code, uppercase (e.g. "EUR").
    pub code: String,
    /// Monetary symbol used by the renderer (e.g. "€").
    pub symbol: String,
    /// Two-digit index embedded in credit note numbers (0..=99).
    pub index: u8,
    /// Number of minor-unit digits (2 for cents).
    pub minor_digits: u32,
}

impl Currency {
    pub fn new(code: &str, symbol: &str, index: u8, minor_digits: u32) -> Self {
        Self {
            code: code.to_ascii_uppercase(),
            symbol: symbol.into(),
            index,
            minor_digits,
        }
    }

    /// Convert an amount in minor units (as the platform reports it) to a decimal.
    pub fn to_major(&self, minor: i64) -> Decimal {
        Decimal::new(minor, self.minor_digits)
    }

    /// Render an amount with the currency symbol, e.g. "€1.00".
    pub fn format(&self, amount: Decimal) -> String {
        format!(
            "{}{:.prec$}",
            self.symbol,
            amount,
            prec = self.minor_digits as usize
        )
    }
}

/// The currencies a run knows about. Loaded once per run and passed by reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Currency>", into = "Vec<Currency>")]
pub struct CurrencyTable {
    entries: Vec<Currency>,
}

impl Default for CurrencyTable {
    /// EUR = 00, USD = 01.
    fn default() -> Self {
        Self {
            entries: vec![
                Currency::new("EUR", "€", 0, 2),
                Currency::new("USD", "$", 1, 2),
            ],
        }
    }
}

impl CurrencyTable {
    /// Build a table, rejecting duplicate indexes, indexes above 99 and more
    /// than 28 minor digits. A repeated code replaces the earlier entry.
    pub fn new(entries: Vec<Currency>) -> Result<Self, ValidationError> {
        let mut table = Self {
            entries: Vec::with_capacity(entries.len()),
        };
        for currency in entries {
            table = table.with(currency)?;
        }
        Ok(table)
    }

    /// Add or replace a currency.
    pub fn with(mut self, currency: Currency) -> Result<Self, ValidationError> {
        if currency.code.len() != 3 || !currency.code.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(ValidationError::new(
                "currency.code",
                &currency.code,
                "currency code must be 3 uppercase letters (ISO 4217)",
            ));
        }
        if currency.index > 99 {
            return Err(ValidationError::new(
                "currency.index",
                currency.index.to_string(),
                "currency index must fit in two digits",
            ));
        }
        if currency.minor_digits > MAX_MINOR_DIGITS {
            return Err(ValidationError::new(
                "currency.minor_digits",
                currency.minor_digits.to_string(),
                format!("at most {MAX_MINOR_DIGITS} minor digits are supported"),
            ));
        }
        self.entries.retain(|c| c.code != currency.code);
        if let Some(clash) = self.entries.iter().find(|c| c.index == currency.index) {
            return Err(ValidationError::new(
                "currency.index",
                currency.index.to_string(),
                format!("index already used by {}", clash.code),
            ));
        }
        self.entries.push(currency);
        Ok(self)
    }

    /// Look up a currency by code (case-insensitive).
    pub fn get(&self, code: &str) -> Result<&Currency, ValidationError> {
        self.entries
            .iter()
            .find(|c| c.code.eq_ignore_ascii_case(code.trim()))
            .ok_or_else(|| ValidationError::new("currency", code, "currency is not supported"))
    }

    /// Currencies in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Currency> {
        self.entries.iter()
    }
}

impl TryFrom<Vec<Currency>> for CurrencyTable {
    type Error = ValidationError;

    fn try_from(entries: Vec<Currency>) -> Result<Self, Self::Error> {
        Self::new(entries)
    }
}

impl From<CurrencyTable> for Vec<Currency> {
    fn from(table: CurrencyTable) -> Self {
        table.entries
    }
}
