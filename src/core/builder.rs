use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

use super::error::{AvoirError, ValidationError};
use super::types::*;

/// Builder for [`Invoice`] records, mostly for callers that assemble
/// snapshots by hand and for tests.
///
/// ```
/// use avoir::core::*;
/// use chrono::NaiveDate;
///
/// let invoice = InvoiceBuilder::new("25001-0010", NaiveDate::from_ymd_opt(2025, 1, 15).unwrap())
///     .status(InvoiceStatus::Void)
///     .customer("cus_1")
///     .amounts(10_000, 2_100)
///     .build()
///     .unwrap();
/// assert_eq!(invoice.total, 12_100);
/// ```
pub struct InvoiceBuilder {
    number: String,
    issue_date: NaiveDate,
    id: Option<String>,
    currency: String,
    status: InvoiceStatus,
    customer: String,
    closed_at: Option<DateTime<Utc>>,
    subtotal: Option<i64>,
    tax: i64,
    total: Option<i64>,
    tax_rate: Option<Decimal>,
    lines: Vec<InvoiceLine>,
    dispute: Option<String>,
    refunds: Vec<String>,
    settlement_refs: Vec<String>,
}

impl InvoiceBuilder {
    pub fn new(number: impl Into<String>, issue_date: NaiveDate) -> Self {
        Self {
            number: number.into(),
            issue_date,
            id: None,
            currency: "EUR".to_string(),
            status: InvoiceStatus::Paid,
            customer: String::new(),
            closed_at: None,
            subtotal: None,
            tax: 0,
            total: None,
            tax_rate: None,
            lines: Vec::new(),
            dispute: None,
            refunds: Vec::new(),
            settlement_refs: Vec::new(),
        }
    }

    /// Platform object id. Defaults to the invoice number.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn currency(mut self, code: impl Into<String>) -> Self {
        self.currency = code.into();
        self
    }

    pub fn status(mut self, status: InvoiceStatus) -> Self {
        self.status = status;
        self
    }

    pub fn customer(mut self, id: impl Into<String>) -> Self {
        self.customer = id.into();
        self
    }

    pub fn closed_at(mut self, at: DateTime<Utc>) -> Self {
        self.closed_at = Some(at);
        self
    }

    /// Subtotal and tax in minor units; the total follows unless set explicitly.
    pub fn amounts(mut self, subtotal: i64, tax: i64) -> Self {
        self.subtotal = Some(subtotal);
        self.tax = tax;
        self
    }

    /// Override the total (platform data is not always consistent).
    pub fn total(mut self, total: i64) -> Self {
        self.total = Some(total);
        self
    }

    pub fn tax_rate(mut self, percent: Decimal) -> Self {
        self.tax_rate = Some(percent);
        self
    }

    pub fn add_line(
        mut self,
        description: impl Into<String>,
        quantity: u32,
        unit_amount: i64,
    ) -> Self {
        self.lines.push(InvoiceLine {
            description: description.into(),
            quantity,
            unit_amount,
            amount: unit_amount * i64::from(quantity),
            tax_rate: None,
        });
        self
    }

    pub fn dispute(mut self, id: impl Into<String>) -> Self {
        self.dispute = Some(id.into());
        self
    }

    pub fn refund(mut self, id: impl Into<String>) -> Self {
        self.refunds.push(id.into());
        self
    }

    pub fn settlement_ref(mut self, reference: impl Into<String>) -> Self {
        self.settlement_refs.push(reference.into());
        self
    }

    /// Build the invoice.
    ///
    /// Without explicit amounts the subtotal is the sum of the lines.
    /// Fails when the number is malformed or the currency is not a
    /// three-letter code.
    pub fn build(self) -> Result<Invoice, AvoirError> {
        let number = InvoiceNumber::parse(&self.number)?;
        let currency = self.currency.trim().to_ascii_uppercase();
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(ValidationError::new(
                "invoice.currency",
                &self.currency,
                "currency code must be 3 letters (ISO 4217)",
            )
            .into());
        }
        let subtotal = self
            .subtotal
            .unwrap_or_else(|| self.lines.iter().map(|l| l.amount).sum());
        let total = self.total.unwrap_or(subtotal + self.tax);

        Ok(Invoice {
            id: self.id.unwrap_or_else(|| number.to_string()),
            number,
            currency,
            status: self.status,
            customer: self.customer,
            issue_date: self.issue_date,
            closed_at: self.closed_at,
            subtotal,
            tax: self.tax,
            total,
            tax_rate: self.tax_rate,
            lines: self.lines,
            dispute: self.dispute,
            refunds: self.refunds,
            settlement_refs: self.settlement_refs,
        })
    }
}

/// Builder for [`Customer`].
pub struct CustomerBuilder {
    customer: Customer,
}

impl CustomerBuilder {
    pub fn new(id: impl Into<String>, name: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            customer: Customer {
                id: id.into(),
                name: name.into(),
                email: None,
                country: country.into(),
                vat_number: None,
                address: Address::default(),
            },
        }
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.customer.email = Some(email.into());
        self
    }

    pub fn vat_number(mut self, vat: impl Into<String>) -> Self {
        self.customer.vat_number = Some(vat.into());
        self
    }

    pub fn address(mut self, address: Address) -> Self {
        self.customer.address = address;
        self
    }

    pub fn build(self) -> Customer {
        self.customer
    }
}
