//! Payouts: which invoices a platform transfer settles, and what it cost.
//!
//! # Example
//!
//! ```
//! use avoir::core::*;
//! use avoir::payout::*;
//! use chrono::NaiveDate;
//!
//! let date = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap();
//! let invoice = InvoiceBuilder::new("25004-0001", date)
//!     .settlement_ref("ch_1")
//!     .build()
//!     .unwrap();
//! let payout = Payout::new("po_1", date, "EUR").settles("ch_1");
//!
//! let invoices = [invoice];
//! let payouts = [payout];
//! let links = link_payouts(&invoices, &payouts).unwrap();
//! assert_eq!(links.payout_for(&invoices[0].number).unwrap().id, "po_1");
//! ```

mod fees;
mod link;

pub use fees::{FeeCategory, FeeSummary, categorize, fee_summary};
pub use link::{LinkedPayout, PayoutLinks, UnknownRef, link_payouts};
pub(crate) use link::reference_index;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Balance transaction type, as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceKind {
    Charge,
    Payment,
    Refund,
    Adjustment,
    /// Fee charged by the platform itself.
    StripeFee,
    /// The transfer to the bank account.
    Payout,
    #[serde(other)]
    Other,
}

/// One balance transaction bundled into a payout. Amounts in minor units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutItem {
    pub id: String,
    pub kind: BalanceKind,
    pub description: String,
    pub gross: i64,
    pub net: i64,
    pub created: NaiveDate,
    /// Settlement reference of the charge or payment behind the item, if any.
    #[serde(default)]
    pub source: Option<String>,
}

impl PayoutItem {
    /// Platform fee withheld on this item.
    pub fn fee(&self) -> i64 {
        self.gross - self.net
    }
}

/// A batch transfer from the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    pub id: String,
    pub arrival_date: NaiveDate,
    pub currency: String,
    /// Net amount transferred, minor units.
    #[serde(default)]
    pub amount: i64,
    /// Total fees withheld, minor units.
    #[serde(default)]
    pub fee: i64,
    /// Settlement references as the platform lists them, in order.
    #[serde(default)]
    pub settles: Vec<String>,
    #[serde(default)]
    pub items: Vec<PayoutItem>,
}

impl Payout {
    pub fn new(
        id: impl Into<String>,
        arrival_date: NaiveDate,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            arrival_date,
            currency: currency.into().to_ascii_uppercase(),
            amount: 0,
            fee: 0,
            settles: Vec::new(),
            items: Vec::new(),
        }
    }

    pub fn settles(mut self, reference: impl Into<String>) -> Self {
        self.settles.push(reference.into());
        self
    }

    pub fn amounts(mut self, amount: i64, fee: i64) -> Self {
        self.amount = amount;
        self.fee = fee;
        self
    }

    pub fn item(mut self, item: PayoutItem) -> Self {
        self.items.push(item);
        self
    }

    /// Items other than the transfer itself, created within `from..=until`.
    pub fn items_between(
        &self,
        from: NaiveDate,
        until: NaiveDate,
    ) -> impl Iterator<Item = &PayoutItem> {
        self.items
            .iter()
            .filter(move |i| i.kind != BalanceKind::Payout && (from..=until).contains(&i.created))
    }
}
