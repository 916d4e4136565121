//! VAT jurisdiction: domestic, reverse charge, OSS or export.
//!
//! # Example
//!
//! ```
//! use avoir::vat::*;
//! use rust_decimal_macros::dec;
//!
//! let rules = JurisdictionRules::new("BE").unwrap();
//! assert_eq!(rules.home_rate().unwrap(), dec!(21));
//! assert!(vat_number_matches("DE", "DE123456789"));
//! ```

mod jurisdiction;
mod oss;
mod vat_number;

pub use jurisdiction::{
    JurisdictionDecision, JurisdictionEvidence, JurisdictionRules, TaxedAmount, Treatment,
    is_business, resolve,
};
pub use oss::{OssCountry, OssTable};
pub use vat_number::{compact_vat_number, vat_number_matches};
