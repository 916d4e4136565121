//! One report row per invoice: jurisdiction, amounts, payout linkage.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use super::account::accounting_account;
use crate::core::{
    AvoirError, CurrencyTable, Customer, Invoice, InvoiceNumber, InvoiceStatus, ValidationError,
};
use crate::payout::{Payout, UnknownRef, link_payouts};
use crate::vat::{JurisdictionRules, Treatment, resolve};

/// Records of one date window.
#[derive(Debug, Clone, Copy)]
pub struct ReportInput<'a> {
    pub invoices: &'a [Invoice],
    pub customers: &'a [Customer],
    pub payouts: &'a [Payout],
    pub rules: &'a JurisdictionRules,
    pub currencies: &'a CurrencyTable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub invoice: InvoiceNumber,
    pub currency: String,
    pub status: InvoiceStatus,
    pub customer: String,
    pub customer_email: Option<String>,
    pub customer_country: String,
    pub business: bool,
    pub treatment: Treatment,
    /// Rate in percent.
    pub rate: Decimal,
    /// Amounts as invoiced, major units.
    pub net: Decimal,
    pub tax: Decimal,
    pub gross: Decimal,
    /// Tax the decided rate yields on `net`.
    pub expected_tax: Decimal,
    pub payout: Option<String>,
    pub payout_arrival: Option<NaiveDate>,
    pub accounting_account: String,
}

impl ReportRow {
    /// Whether the invoiced tax agrees with the jurisdiction decision.
    pub fn tax_matches(&self) -> bool {
        self.tax == self.expected_tax
    }

    pub fn is_taxable(&self) -> bool {
        !self.tax.is_zero()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// Ordered by currency then invoice number.
    pub rows: Vec<ReportRow>,
    pub unknown_refs: Vec<UnknownRef>,
}

impl Report {
    /// Rows whose invoice no payout settles.
    pub fn unsettled(&self) -> impl Iterator<Item = &ReportRow> {
        self.rows.iter().filter(|r| r.payout.is_none())
    }
}

/// Resolve, convert and link every non-draft invoice of the window.
///
/// Fails on the first invoice that cannot be reported: unknown customer,
/// country or currency, or amounts that do not reconcile.
pub fn aggregate(input: &ReportInput<'_>) -> Result<Report, AvoirError> {
    let customers: HashMap<&str, &Customer> =
        input.customers.iter().map(|c| (c.id.as_str(), c)).collect();
    let links = link_payouts(input.invoices, input.payouts)?;

    let mut invoices: Vec<&Invoice> = input
        .invoices
        .iter()
        .filter(|i| i.status != InvoiceStatus::Draft)
        .collect();
    invoices.sort_by(|a, b| (&a.currency, &a.number).cmp(&(&b.currency, &b.number)));

    let mut rows = Vec::with_capacity(invoices.len());
    for invoice in invoices {
        invoice.check_amounts()?;
        let customer = customers
            .get(invoice.customer.as_str())
            .copied()
            .ok_or_else(|| {
                ValidationError::new(
                    "invoice.customer",
                    &invoice.customer,
                    format!("customer of invoice {} is not in the window", invoice.number),
                )
            })?;
        let currency = input.currencies.get(&invoice.currency)?;
        let decision = resolve(invoice, customer, input.rules)?;
        let net = currency.to_major(invoice.subtotal);
        let payout = links.payout_for(&invoice.number);

        rows.push(ReportRow {
            invoice: invoice.number.clone(),
            currency: currency.code.clone(),
            status: invoice.status,
            customer: customer.name.clone(),
            customer_email: customer.email.clone(),
            customer_country: decision.evidence.customer_country.clone(),
            business: decision.evidence.business,
            treatment: decision.treatment,
            rate: decision.rate,
            net,
            tax: currency.to_major(invoice.tax),
            gross: currency.to_major(invoice.total),
            expected_tax: decision.apply(net).tax,
            payout: payout.map(|p| p.id.clone()),
            payout_arrival: payout.map(|p| p.arrival_date),
            accounting_account: accounting_account(&decision, customer),
        });
    }

    tracing::info!(
        rows = rows.len(),
        unknown_refs = links.unknown_refs.len(),
        "report aggregated"
    );
    Ok(Report {
        rows,
        unknown_refs: links.unknown_refs,
    })
}
