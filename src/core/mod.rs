//! Billing records, credit note classification and numbering.
//!
//! The records mirror what the payment platform returns for one date
//! window. Classification and numbering are pure functions over them: the
//! numbering state goes in as [`NumberingPlan`] and comes back out in
//! [`NumberingOutcome`], so repeated runs are reproducible.

mod builder;
mod classify;
pub mod countries;
mod currencies;
mod document;
mod error;
mod money;
mod numbering;
mod settings;
mod skip;
mod types;

pub use builder::*;
pub use classify::*;
pub use countries::{is_known_country_code, normalize_country};
pub use currencies::*;
pub use document::*;
pub use error::*;
pub use money::*;
pub use numbering::*;
pub use settings::*;
pub use skip::*;
pub use types::*;
