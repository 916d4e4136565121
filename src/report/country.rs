//! Paid taxable revenue per customer country.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

use super::rows::ReportRow;
use crate::core::InvoiceStatus;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CountryTotals {
    pub invoices: usize,
    pub excluding_tax: Decimal,
    pub including_tax: Decimal,
}

impl CountryTotals {
    pub fn tax(&self) -> Decimal {
        self.including_tax - self.excluding_tax
    }
}

/// Totals of paid, taxed invoices keyed by (customer country, currency).
pub fn vat_per_country<'a>(
    rows: impl IntoIterator<Item = &'a ReportRow>,
) -> BTreeMap<(String, String), CountryTotals> {
    let mut totals: BTreeMap<(String, String), CountryTotals> = BTreeMap::new();
    for row in rows
        .into_iter()
        .filter(|r| r.status == InvoiceStatus::Paid && r.is_taxable())
    {
        let entry = totals
            .entry((row.customer_country.clone(), row.currency.clone()))
            .or_default();
        entry.invoices += 1;
        entry.excluding_tax += row.net;
        entry.including_tax += row.gross;
    }
    totals
}
