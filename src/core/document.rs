//! Data bundle handed to the credit note renderer.
//!
//! The renderer only fills a template; every field it needs is resolved and
//! every amount reconciled here, so a bundle that assembles is complete.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use super::currencies::CurrencyTable;
use super::error::{AvoirError, ConsistencyError, ValidationError};
use super::money::Money;
use super::settings::Company;
use super::types::{CreditNote, Customer, Invoice, InvoiceNumber};

/// Which template the renderer should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Template {
    WithTax,
    WithoutTax,
}

impl Template {
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::WithTax => "credit_note_with_tax.html",
            Self::WithoutTax => "credit_note_without_tax.html",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentLine {
    pub description: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub amount: Money,
    /// Tax rate in percent; `None` for untaxed lines.
    pub tax_rate: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreditNoteDocument {
    pub credit_note_number: String,
    pub invoice_number: InvoiceNumber,
    pub issue_date: NaiveDate,
    pub company: Company,
    pub customer: Customer,
    pub lines: Vec<DocumentLine>,
    pub subtotal: Money,
    pub tax: Money,
    pub total: Money,
    pub tax_rate: Option<Decimal>,
    /// Amount credited back; the full invoice total.
    pub total_adjustment: Money,
    pub adjustment_applied_to_invoice: Money,
    pub currency_symbol: String,
}

impl CreditNoteDocument {
    /// Assemble the bundle for `note`, generated for `invoice`.
    pub fn assemble(
        note: &CreditNote,
        invoice: &Invoice,
        customer: &Customer,
        company: &Company,
        currencies: &CurrencyTable,
    ) -> Result<Self, AvoirError> {
        let number = invoice.number.to_string();
        if note.invoice != invoice.number {
            return Err(ValidationError::new(
                "credit_note.invoice",
                &note.number,
                format!("credit note is linked to {}, not {number}", note.invoice),
            )
            .into());
        }
        if !note.currency.eq_ignore_ascii_case(&invoice.currency) {
            return Err(ConsistencyError::CurrencyMismatch {
                invoice: number,
                credit_note: note.number.clone(),
                invoice_currency: invoice.currency.clone(),
                credit_note_currency: note.currency.clone(),
            }
            .into());
        }
        if customer.id != invoice.customer {
            return Err(ValidationError::new(
                "customer",
                &customer.id,
                format!("invoice {number} was billed to {}", invoice.customer),
            )
            .into());
        }
        invoice.check_amounts()?;
        if !invoice.lines.is_empty() {
            let lines_total = invoice
                .lines
                .iter()
                .try_fold(0i64, |sum, l| sum.checked_add(l.amount))
                .ok_or_else(|| {
                    ValidationError::new("invoice.lines", &number, "line amounts overflow")
                })?;
            if lines_total != invoice.subtotal {
                return Err(ValidationError::new(
                    "invoice.lines",
                    &number,
                    format!(
                        "line amounts sum to {lines_total}, subtotal is {}",
                        invoice.subtotal
                    ),
                )
                .into());
            }
        }
        let tax_rate = match (invoice.tax, invoice.tax_rate) {
            (0, _) => None,
            (_, Some(rate)) => Some(rate),
            (_, None) => {
                return Err(ValidationError::new(
                    "invoice.tax_rate",
                    &number,
                    "invoice is taxed but carries no tax rate",
                )
                .into());
            }
        };

        let currency = currencies.get(&invoice.currency)?;
        let lines = invoice
            .lines
            .iter()
            .map(|l| DocumentLine {
                description: l.description.clone(),
                quantity: l.quantity,
                unit_price: Money::from_minor(l.unit_amount, currency),
                amount: Money::from_minor(l.amount, currency),
                tax_rate: l.tax_rate.or(tax_rate),
            })
            .collect();
        let total = Money::from_minor(invoice.total, currency);

        Ok(Self {
            credit_note_number: note.number.clone(),
            invoice_number: invoice.number.clone(),
            issue_date: note.issue_date,
            company: company.clone(),
            customer: customer.clone(),
            lines,
            subtotal: Money::from_minor(invoice.subtotal, currency),
            tax: Money::from_minor(invoice.tax, currency),
            total_adjustment: total.clone(),
            adjustment_applied_to_invoice: total.clone(),
            total,
            tax_rate,
            currency_symbol: currency.symbol.clone(),
        })
    }

    pub fn is_taxable(&self) -> bool {
        self.tax_rate.is_some()
    }

    pub fn template(&self) -> Template {
        if self.is_taxable() {
            Template::WithTax
        } else {
            Template::WithoutTax
        }
    }

    /// `{yyyymmdd}-CN-{credit note}-INVOICE-{invoice}`, without extension.
    pub fn file_stem(&self) -> String {
        format!(
            "{}-CN-{}-INVOICE-{}",
            self.issue_date.format("%Y%m%d"),
            self.credit_note_number,
            self.invoice_number
        )
    }
}
