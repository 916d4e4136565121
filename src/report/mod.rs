//! Tabular VAT and payout reports, one row per invoice or per payout item.
//!
//! Rows are plain data for a serializer outside this crate.

mod account;
mod country;
mod items;
mod rows;

pub use account::accounting_account;
pub use country::{CountryTotals, vat_per_country};
pub use items::{PayoutItemRow, payout_item_rows};
pub use rows::{Report, ReportInput, ReportRow, aggregate};
