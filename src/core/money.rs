use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::currencies::Currency;
use super::error::ValidationError;

/// A decimal amount tagged with its currency code.
///
/// Arithmetic never mixes currencies: adding a USD amount to a EUR amount is
/// a [`ValidationError`], not a conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    pub amount: Decimal,
    pub currency: String,
}

impl Money {
    pub fn new(amount: Decimal, currency: impl Into<String>) -> Self {
        Self {
            amount,
            currency: currency.into(),
        }
    }

    /// Convert a platform amount in minor units.
    pub fn from_minor(minor: i64, currency: &Currency) -> Self {
        Self::new(currency.to_major(minor), currency.code.clone())
    }

    pub fn checked_add(&self, other: &Money) -> Result<Money, ValidationError> {
        if !self.currency.eq_ignore_ascii_case(&other.currency) {
            return Err(ValidationError::new(
                "currency",
                &other.currency,
                format!("cannot add {} to {}", other.currency, self.currency),
            ));
        }
        Ok(Money::new(self.amount + other.amount, self.currency.clone()))
    }

    /// Sum a non-empty list of amounts in one currency.
    pub fn sum<'a>(items: impl IntoIterator<Item = &'a Money>) -> Result<Money, ValidationError> {
        let mut items = items.into_iter();
        let first = items
            .next()
            .ok_or_else(|| ValidationError::new("amounts", "", "cannot sum an empty list"))?;
        items.try_fold(first.clone(), |acc, m| acc.checked_add(m))
    }

    pub fn abs(&self) -> Money {
        Money::new(self.amount.abs(), self.currency.clone())
    }

    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2} {}", self.amount, self.currency)
    }
}
