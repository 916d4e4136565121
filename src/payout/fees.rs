//! Categorisation of payout items for the detailed VAT report.

use std::collections::BTreeMap;

use serde::Serialize;

use super::{BalanceKind, Payout, PayoutItem};
use crate::core::{AvoirError, CurrencyTable, Money, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeCategory {
    Billing,
    TaxProduct,
    ProcessingCard,
    ProcessingOther,
    Radar,
    Disputes,
    DisputeFees,
    BankAccount,
}

impl FeeCategory {
    /// Label used in the accounting export.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Billing => "Billing Fees",
            Self::TaxProduct => "Tax Product Fees",
            Self::ProcessingCard => "Stripe Processing Fees (card)",
            Self::ProcessingOther => "Stripe Processing Fees (other)",
            Self::Radar => "Radar Stripe Fees",
            Self::Disputes => "Disputes",
            Self::DisputeFees => "Dispute Fees",
            Self::BankAccount => "Bank account",
        }
    }

    /// The reportable amount of `item` under this category, always positive.
    ///
    /// Platform product fees are reported by their gross amount, everything
    /// else by the fee withheld.
    pub fn amount_of(&self, item: &PayoutItem) -> i64 {
        match self {
            Self::Billing | Self::TaxProduct | Self::Radar => item.gross.abs(),
            _ => item.fee().abs(),
        }
    }
}

impl std::fmt::Display for FeeCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

type Rule = (FeeCategory, &'static str, Option<BalanceKind>);

/// Description prefix and, where it matters, item kind. First match wins.
static RULES: &[Rule] = &[
    (FeeCategory::Billing, "Billing", None),
    (FeeCategory::TaxProduct, "Automatic Taxes", None),
    (FeeCategory::ProcessingCard, "Subscription", Some(BalanceKind::Charge)),
    (FeeCategory::ProcessingOther, "Subscription", Some(BalanceKind::Payment)),
    (FeeCategory::Radar, "Radar", None),
    (FeeCategory::Disputes, "REFUND FOR CHARGE", None),
    (FeeCategory::BankAccount, "REFUND FOR PAYMENT", None),
    (FeeCategory::DisputeFees, "Chargeback withdrawal", None),
];

/// Category of one item of `payout`.
///
/// An item no rule recognises fails with a [`ValidationError`] naming the
/// item, its description and the payout.
pub fn categorize(item: &PayoutItem, payout: &Payout) -> Result<FeeCategory, AvoirError> {
    RULES
        .iter()
        .find(|(_, prefix, kind)| {
            item.description.starts_with(prefix) && kind.is_none_or(|k| k == item.kind)
        })
        .map(|(category, _, _)| *category)
        .ok_or_else(|| {
            ValidationError::new(
                "payout_item.description",
                &item.description,
                format!(
                    "no fee category for item {} of payout {} ({})",
                    item.id, payout.id, payout.arrival_date
                ),
            )
            .into()
        })
}

/// Fee totals per currency and category.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeeSummary {
    pub totals: BTreeMap<(String, FeeCategory), Money>,
}

impl FeeSummary {
    pub fn get(&self, currency: &str, category: FeeCategory) -> Option<&Money> {
        self.totals.get(&(currency.to_string(), category))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, FeeCategory, &Money)> {
        self.totals.iter().map(|((c, k), m)| (c.as_str(), *k, m))
    }
}

/// Categorise and sum every item of `payouts`, skipping the transfers
/// themselves. One unknown item fails the whole summary.
pub fn fee_summary<'a>(
    payouts: impl IntoIterator<Item = &'a Payout>,
    currencies: &CurrencyTable,
) -> Result<FeeSummary, AvoirError> {
    let mut summary = FeeSummary::default();
    for payout in payouts {
        let currency = currencies.get(&payout.currency)?;
        for item in payout.items.iter().filter(|i| i.kind != BalanceKind::Payout) {
            let category = categorize(item, payout)?;
            let amount = Money::from_minor(category.amount_of(item), currency);
            let key = (currency.code.clone(), category);
            let total = match summary.totals.get(&key) {
                Some(sum) => sum.checked_add(&amount)?,
                None => amount,
            };
            summary.totals.insert(key, total);
        }
    }
    tracing::debug!(categories = summary.totals.len(), "fee summary computed");
    Ok(summary)
}
