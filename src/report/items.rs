//! One report row per payout item, joined to the invoice it settles.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use super::account::accounting_account;
use super::rows::ReportInput;
use crate::core::{AvoirError, Customer, InvoiceNumber, ValidationError};
use crate::payout::{BalanceKind, FeeCategory, categorize, reference_index};
use crate::vat::resolve;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PayoutItemRow {
    pub item: String,
    pub description: String,
    pub kind: BalanceKind,
    pub currency: String,
    /// Amounts in major units.
    pub gross: Decimal,
    pub net: Decimal,
    pub fee: Decimal,
    pub created: NaiveDate,
    /// The invoice behind the item's source, when it is in the window.
    pub invoice: Option<InvoiceNumber>,
    pub customer_email: Option<String>,
    pub customer_country: Option<String>,
    pub accounting_account: Option<String>,
    pub category: FeeCategory,
    /// The item's amount under `category`, always positive.
    pub category_amount: Decimal,
    pub payout: String,
    pub payout_arrival: NaiveDate,
}

/// Rows for every payout item created within `from..=until`, in payout
/// order then item order. The transfers themselves are left out.
///
/// An item whose source matches no invoice of the window still gets a row,
/// without invoice columns. Fails on an item no fee category recognises and
/// on an invoice whose customer is missing.
pub fn payout_item_rows(
    input: &ReportInput<'_>,
    from: NaiveDate,
    until: NaiveDate,
) -> Result<Vec<PayoutItemRow>, AvoirError> {
    let refs = reference_index(input.invoices)?;
    let customers: HashMap<&str, &Customer> =
        input.customers.iter().map(|c| (c.id.as_str(), c)).collect();

    let mut rows = Vec::new();
    for payout in input.payouts {
        let currency = input.currencies.get(&payout.currency)?;
        for item in payout.items_between(from, until) {
            let category = categorize(item, payout)?;
            let mut row = PayoutItemRow {
                item: item.id.clone(),
                description: item.description.clone(),
                kind: item.kind,
                currency: currency.code.clone(),
                gross: currency.to_major(item.gross),
                net: currency.to_major(item.net),
                fee: currency.to_major(item.fee()),
                created: item.created,
                invoice: None,
                customer_email: None,
                customer_country: None,
                accounting_account: None,
                category,
                category_amount: currency.to_major(category.amount_of(item)),
                payout: payout.id.clone(),
                payout_arrival: payout.arrival_date,
            };

            let invoice = item.source.as_deref().and_then(|s| refs.get(s)).copied();
            if let Some(invoice) = invoice {
                let customer = customers
                    .get(invoice.customer.as_str())
                    .copied()
                    .ok_or_else(|| {
                        ValidationError::new(
                            "invoice.customer",
                            &invoice.customer,
                            format!(
                                "customer of invoice {} is not in the window",
                                invoice.number
                            ),
                        )
                    })?;
                let decision = resolve(invoice, customer, input.rules)?;
                row.invoice = Some(invoice.number.clone());
                row.customer_email = customer.email.clone();
                row.customer_country = Some(decision.evidence.customer_country.clone());
                row.accounting_account = Some(accounting_account(&decision, customer));
            } else {
                tracing::debug!(
                    item = %item.id,
                    payout = %payout.id,
                    "payout item without invoice"
                );
            }
            rows.push(row);
        }
    }

    tracing::info!(rows = rows.len(), %from, %until, "payout items reported");
    Ok(rows)
}
