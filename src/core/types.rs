use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::{AvoirError, ConsistencyError, ValidationError};

/// Invoice identifier of the form `{prefix}-{sequence}`, e.g. "25001-0010".
///
/// Ordering and equality use the numeric value of the sequence, so
/// `25001-0009 < 25001-0010` and `25001-10 == 25001-0010`. The zero-pad
/// width of the parsed form is kept for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InvoiceNumber {
    prefix: String,
    sequence: u32,
    width: usize,
}

impl InvoiceNumber {
    pub fn new(prefix: impl Into<String>, sequence: u32, width: usize) -> Self {
        Self {
            prefix: prefix.into(),
            sequence,
            width,
        }
    }

    /// Parse `{prefix}-{digits}`. The prefix is everything before the last `-`.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let s = s.trim();
        let (prefix, digits) = s
            .rsplit_once('-')
            .ok_or_else(|| ValidationError::new("invoice_number", s, "expected PREFIX-NNNN"))?;
        if prefix.is_empty()
            || prefix
                .chars()
                .any(|c| c.is_whitespace() || c == ',' || c == ':')
        {
            return Err(ValidationError::new(
                "invoice_number",
                s,
                "prefix must be non-empty and contain no separators",
            ));
        }
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(ValidationError::new(
                "invoice_number",
                s,
                "sequence component must be numeric",
            ));
        }
        let sequence = digits
            .parse::<u32>()
            .map_err(|_| ValidationError::new("invoice_number", s, "sequence out of range"))?;
        Ok(Self::new(prefix, sequence, digits.len()))
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    /// Same prefix and padding, different sequence.
    pub fn with_sequence(&self, sequence: u32) -> Self {
        Self::new(self.prefix.clone(), sequence, self.width)
    }
}

impl PartialEq for InvoiceNumber {
    fn eq(&self, other: &Self) -> bool {
        self.prefix == other.prefix && self.sequence == other.sequence
    }
}

impl Eq for InvoiceNumber {}

impl Hash for InvoiceNumber {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.prefix.hash(state);
        self.sequence.hash(state);
    }
}

impl Ord for InvoiceNumber {
    fn cmp(&self, other: &Self) -> Ordering {
        self.prefix
            .cmp(&other.prefix)
            .then(self.sequence.cmp(&other.sequence))
    }
}

impl PartialOrd for InvoiceNumber {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for InvoiceNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}-{:0>width$}",
            self.prefix,
            self.sequence,
            width = self.width
        )
    }
}

impl FromStr for InvoiceNumber {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for InvoiceNumber {
    type Error = ValidationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<InvoiceNumber> for String {
    fn from(n: InvoiceNumber) -> Self {
        n.to_string()
    }
}

/// Invoice lifecycle status as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Draft,
    Open,
    Paid,
    Void,
    Uncollectible,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Open => "open",
            Self::Paid => "paid",
            Self::Void => "void",
            Self::Uncollectible => "uncollectible",
        }
    }
}

impl std::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A billed line. Amounts are in minor units, excluding tax.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceLine {
    pub description: String,
    pub quantity: u32,
    pub unit_amount: i64,
    pub amount: i64,
    /// Line tax rate in percent; falls back to the invoice rate when absent.
    pub tax_rate: Option<Decimal>,
}

/// An invoice fetched from the payment platform. Amounts are in minor units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    /// Platform object id (e.g. "in_1Nx...").
    pub id: String,
    pub number: InvoiceNumber,
    /// ISO 4217 code, uppercase.
    pub currency: String,
    pub status: InvoiceStatus,
    /// Customer id this invoice was billed to.
    pub customer: String,
    /// Finalization date (or period start for unfinalized invoices).
    pub issue_date: NaiveDate,
    /// When the invoice was paid or voided.
    pub closed_at: Option<DateTime<Utc>>,
    pub subtotal: i64,
    pub tax: i64,
    pub total: i64,
    /// Applied tax rate in percent, when the invoice is taxed.
    pub tax_rate: Option<Decimal>,
    pub lines: Vec<InvoiceLine>,
    /// Dispute opened against this invoice's charge.
    pub dispute: Option<String>,
    /// Refunds issued against this invoice's charge.
    pub refunds: Vec<String>,
    /// Opaque settlement references (charge / payment ids) that payouts use.
    pub settlement_refs: Vec<String>,
}

impl Invoice {
    /// subtotal + tax = total.
    pub fn amounts_reconcile(&self) -> bool {
        self.subtotal.checked_add(self.tax) == Some(self.total)
    }

    /// Fail with a [`ValidationError`] naming the invoice when amounts do not reconcile.
    pub fn check_amounts(&self) -> Result<(), ValidationError> {
        if self.amounts_reconcile() {
            Ok(())
        } else {
            Err(ValidationError::new(
                "invoice.total",
                self.number.to_string(),
                format!(
                    "subtotal {} + tax {} does not equal total {}",
                    self.subtotal, self.tax, self.total
                ),
            ))
        }
    }

    /// File name (without extension) for the downloaded platform document.
    pub fn document_name(&self) -> String {
        format!(
            "{} - Invoice {} - Status {}",
            self.issue_date.format("%Y%m%d"),
            self.number,
            self.status
        )
    }
}

/// Index a window's invoices by number.
///
/// Two records carrying the same number fail with
/// [`ConsistencyError::DuplicateInvoice`] naming both platform ids.
pub fn index_invoices(
    invoices: &[Invoice],
) -> Result<BTreeMap<&InvoiceNumber, &Invoice>, AvoirError> {
    let mut index = BTreeMap::new();
    for invoice in invoices {
        if let Some(first) = index.insert(&invoice.number, invoice) {
            return Err(ConsistencyError::DuplicateInvoice {
                invoice: invoice.number.to_string(),
                first_id: first.id.clone(),
                second_id: invoice.id.clone(),
            }
            .into());
        }
    }
    Ok(index)
}

/// Postal address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub line1: String,
    pub line2: Option<String>,
    pub postal_code: String,
    pub city: String,
    pub state: Option<String>,
}

/// Customer master data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    /// Country as supplied by the platform; normalised by the jurisdiction resolver.
    pub country: String,
    pub vat_number: Option<String>,
    pub address: Address,
}

/// Dispute outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisputeStatus {
    Lost,
    Won,
    WarningClosed,
    NeedsResponse,
    UnderReview,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dispute {
    pub id: String,
    pub status: DisputeStatus,
    pub amount: i64,
    pub created: NaiveDate,
}

impl Dispute {
    pub fn is_lost(&self) -> bool {
        self.status == DisputeStatus::Lost
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefundStatus {
    Succeeded,
    Pending,
    Failed,
    Canceled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Refund {
    pub id: String,
    pub amount: i64,
    pub status: RefundStatus,
    pub created: NaiveDate,
}

impl Refund {
    /// Failed and canceled refunds moved no money.
    pub fn is_effective(&self) -> bool {
        matches!(self.status, RefundStatus::Succeeded | RefundStatus::Pending)
    }
}

/// Why a credit note was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditNoteReason {
    Void,
    Uncollectible,
    Refund,
    DisputeLost,
    OpenIncluded,
}

/// Who issued a credit note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditNoteOrigin {
    Platform,
    Generated,
}

/// A credit note, either issued on the platform or generated by this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditNote {
    pub number: String,
    pub invoice: InvoiceNumber,
    pub currency: String,
    pub issue_date: NaiveDate,
    /// Credited amount in minor units.
    pub amount: i64,
    pub reason: Option<CreditNoteReason>,
    pub origin: CreditNoteOrigin,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_ordering() {
        let a = InvoiceNumber::parse("25001-0009").unwrap();
        let b = InvoiceNumber::parse("25001-0010").unwrap();
        assert!(a < b);
        // lexical order would say otherwise
        let c = InvoiceNumber::parse("25001-9").unwrap();
        let d = InvoiceNumber::parse("25001-10").unwrap();
        assert!(c < d);
    }

    #[test]
    fn padding_is_kept_for_display_only() {
        let n = InvoiceNumber::parse("25001-0042").unwrap();
        assert_eq!(n.to_string(), "25001-0042");
        assert_eq!(n, InvoiceNumber::parse("25001-42").unwrap());
        assert_eq!(n.with_sequence(43).to_string(), "25001-0043");
    }

    #[test]
    fn prefix_may_contain_dashes() {
        let n = InvoiceNumber::parse("ACME-2025-0007").unwrap();
        assert_eq!(n.prefix(), "ACME-2025");
        assert_eq!(n.sequence(), 7);
    }

    #[test]
    fn malformed_numbers() {
        for bad in ["", "250010010", "-0010", "25001-", "25001-00x1", "25 001-0001"] {
            assert!(InvoiceNumber::parse(bad).is_err(), "{bad:?} should fail");
        }
    }

    #[test]
    fn serde_as_string() {
        let n = InvoiceNumber::parse("25001-0003").unwrap();
        let json = serde_json::to_string(&n).unwrap();
        assert_eq!(json, "\"25001-0003\"");
        let back: InvoiceNumber = serde_json::from_str(&json).unwrap();
        assert_eq!(back, n);
        assert!(serde_json::from_str::<InvoiceNumber>("\"nope\"").is_err());
    }
}
