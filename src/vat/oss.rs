//! One-Stop-Shop participating countries and their standard VAT rates.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// A participating country.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OssCountry {
    /// English short name, used in accounting labels ("OSS Belgium").
    pub name: String,
    /// Standard VAT rate in percent.
    pub standard_rate: Decimal,
}

/// EU member states, standard rates as published for 2025
/// (EE from 2025-07-01, RO from 2025-08-01).
const EU_STANDARD_RATES: &[(&str, &str, Decimal)] = &[
    ("AT", "Austria", dec!(20)),
    ("BE", "Belgium", dec!(21)),
    ("BG", "Bulgaria", dec!(20)),
    ("CY", "Cyprus", dec!(19)),
    ("CZ", "Czechia", dec!(21)),
    ("DE", "Germany", dec!(19)),
    ("DK", "Denmark", dec!(25)),
    ("EE", "Estonia", dec!(24)),
    ("ES", "Spain", dec!(21)),
    ("FI", "Finland", dec!(25.5)),
    ("FR", "France", dec!(20)),
    ("GR", "Greece", dec!(24)),
    ("HR", "Croatia", dec!(25)),
    ("HU", "Hungary", dec!(27)),
    ("IE", "Ireland", dec!(23)),
    ("IT", "Italy", dec!(22)),
    ("LT", "Lithuania", dec!(21)),
    ("LU", "Luxembourg", dec!(17)),
    ("LV", "Latvia", dec!(21)),
    ("MT", "Malta", dec!(18)),
    ("NL", "Netherlands", dec!(21)),
    ("PL", "Poland", dec!(23)),
    ("PT", "Portugal", dec!(23)),
    ("RO", "Romania", dec!(21)),
    ("SE", "Sweden", dec!(25)),
    ("SI", "Slovenia", dec!(22)),
    ("SK", "Slovakia", dec!(23)),
];

/// Country code → participating country. Injected per run; the default is
/// the EU-27 table above.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OssTable {
    countries: BTreeMap<String, OssCountry>,
}

impl Default for OssTable {
    fn default() -> Self {
        let countries = EU_STANDARD_RATES
            .iter()
            .map(|(code, name, rate)| {
                (
                    code.to_string(),
                    OssCountry {
                        name: name.to_string(),
                        standard_rate: *rate,
                    },
                )
            })
            .collect();
        Self { countries }
    }
}

impl OssTable {
    /// An empty table; every foreign customer is then export-exempt.
    pub fn empty() -> Self {
        Self {
            countries: BTreeMap::new(),
        }
    }

    /// Add a country or replace its entry.
    pub fn with_country(mut self, code: &str, name: &str, standard_rate: Decimal) -> Self {
        self.countries.insert(
            code.to_ascii_uppercase(),
            OssCountry {
                name: name.into(),
                standard_rate,
            },
        );
        self
    }

    /// Change the standard rate of a listed country. Unlisted codes are ignored.
    pub fn with_rate(mut self, code: &str, standard_rate: Decimal) -> Self {
        if let Some(c) = self.countries.get_mut(&code.to_ascii_uppercase()) {
            c.standard_rate = standard_rate;
        }
        self
    }

    pub fn get(&self, code: &str) -> Option<&OssCountry> {
        self.countries.get(code)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.countries.contains_key(code)
    }

    pub fn len(&self) -> usize {
        self.countries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OssCountry)> {
        self.countries.iter().map(|(k, v)| (k.as_str(), v))
    }
}
