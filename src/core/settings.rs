//! Run-wide read-only configuration.
//!
//! Loaded once per run by the caller and passed by reference; nothing in
//! this crate reads the environment or keeps global state.

use serde::{Deserialize, Serialize};

use super::classify::PartialRefundPolicy;
use super::currencies::CurrencyTable;
use super::error::{AvoirError, ValidationError};

/// The issuing company, as printed on credit notes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Company {
    pub name: String,
    pub address_line_1: String,
    pub address_line_2: String,
    pub postal_code: String,
    pub city: String,
    /// ISO 3166-1 alpha-2 home country.
    pub country: String,
    pub email: String,
    pub vat_number: String,
}

/// Everything one run needs besides the records themselves.
///
/// ```
/// use avoir::Settings;
///
/// let settings = Settings::from_json(r#"{
///     "company": { "name": "Acme SRL", "country": "BE" },
///     "refund_policy": "trust_platform"
/// }"#).unwrap();
/// assert_eq!(settings.home_country(), "BE");
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub company: Company,
    pub currencies: CurrencyTable,
    pub refund_policy: PartialRefundPolicy,
    /// OSS participating countries and their standard rates.
    #[cfg(feature = "vat")]
    pub oss: crate::vat::OssTable,
}

impl Settings {
    /// Parse settings from JSON; absent fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, AvoirError> {
        serde_json::from_str(json).map_err(|e| {
            ValidationError::new("settings", format!("line {}", e.line()), e.to_string()).into()
        })
    }

    pub fn home_country(&self) -> &str {
        &self.company.country
    }

    /// Jurisdiction rules for the company's home country.
    #[cfg(feature = "vat")]
    pub fn jurisdiction_rules(&self) -> Result<crate::vat::JurisdictionRules, AvoirError> {
        Ok(crate::vat::JurisdictionRules::new(self.home_country())?.with_oss(self.oss.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_to_missing_fields() {
        let s = Settings::from_json(r#"{ "company": { "name": "Acme" } }"#).unwrap();
        assert_eq!(s.company.name, "Acme");
        assert_eq!(s.currencies, CurrencyTable::default());
        assert_eq!(s.refund_policy, PartialRefundPolicy::Regenerate);
    }

    #[test]
    fn currencies_are_validated_on_load() {
        let json = r#"{ "currencies": [
            { "code": "EUR", "symbol": "€", "index": 0, "minor_digits": 2 },
            { "code": "GBP", "symbol": "£", "index": 0, "minor_digits": 2 }
        ] }"#;
        let err = Settings::from_json(json).unwrap_err();
        assert_eq!(err.as_validation().unwrap().field, "settings");
    }

    #[test]
    fn oversized_minor_digits_fail_on_load() {
        let json = r#"{ "currencies": [
            { "code": "EUR", "symbol": "€", "index": 0, "minor_digits": 29 }
        ] }"#;
        let err = Settings::from_json(json).unwrap_err();
        let v = err.as_validation().unwrap();
        assert_eq!(v.field, "settings");
        assert!(v.message.contains("currency.minor_digits"));
    }

    #[test]
    fn malformed_json() {
        assert!(Settings::from_json("{").is_err());
    }
}
