//! Decide which invoices of a window need a generated credit note.
//!
//! Each invoice is run through [`RULES`] top to bottom; the first matching
//! rule is the reason, every matching rule is kept as evidence.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use super::error::{AvoirError, ConsistencyError, ValidationError};
use super::types::*;

/// Why an invoice was selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reason {
    /// A credit note already exists on the platform; audited, never numbered.
    AlreadyIssued,
    Voided,
    Uncollectible,
    DisputeLost,
    Refunded,
    OpenIncluded,
}

impl Reason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AlreadyIssued => "already_issued",
            Self::Voided => "voided",
            Self::Uncollectible => "uncollectible",
            Self::DisputeLost => "dispute_lost",
            Self::Refunded => "refunded",
            Self::OpenIncluded => "open_included",
        }
    }

    /// The reason printed on a generated credit note; `None` for audit-only entries.
    pub fn credit_note_reason(&self) -> Option<CreditNoteReason> {
        match self {
            Self::AlreadyIssued => None,
            Self::Voided => Some(CreditNoteReason::Void),
            Self::Uncollectible => Some(CreditNoteReason::Uncollectible),
            Self::DisputeLost => Some(CreditNoteReason::DisputeLost),
            Self::Refunded => Some(CreditNoteReason::Refund),
            Self::OpenIncluded => Some(CreditNoteReason::OpenIncluded),
        }
    }

    pub fn generates(&self) -> bool {
        !matches!(self, Self::AlreadyIssued)
    }
}

impl std::fmt::Display for Reason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a platform credit note is weighed against the invoice's refunds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartialRefundPolicy {
    /// A platform note smaller than the refunded amount does not count as
    /// issued: the invoice is classified `refunded`.
    #[default]
    Regenerate,
    /// Any platform note counts as issued, whatever its amount.
    TrustPlatform,
}

#[derive(Debug, Clone, Default)]
pub struct ClassifyOptions {
    /// Also credit invoices that are still open.
    pub include_open: bool,
    pub refund_policy: PartialRefundPolicy,
    /// Only classify invoices in this currency.
    pub currency: Option<String>,
}

/// Records of one date window.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassificationInput<'a> {
    pub invoices: &'a [Invoice],
    pub disputes: &'a [Dispute],
    pub refunds: &'a [Refund],
    /// Credit notes already issued on the platform.
    pub credit_notes: &'a [CreditNote],
}

/// One selected invoice.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedInvoice<'a> {
    pub invoice: &'a Invoice,
    pub reason: Reason,
    /// Every rule that matched, in rule order; `evidence[0] == reason`.
    pub evidence: Vec<Reason>,
    /// The platform note that covers this invoice, if any.
    pub platform_note: Option<&'a CreditNote>,
}

/// Selected invoices ordered by currency, then invoice number.
#[derive(Debug, Clone, Default)]
pub struct Classification<'a> {
    entries: Vec<ClassifiedInvoice<'a>>,
}

impl<'a> Classification<'a> {
    pub fn entries(&self) -> &[ClassifiedInvoice<'a>] {
        &self.entries
    }

    /// Entries that need a generated credit note.
    pub fn to_generate(&self) -> impl Iterator<Item = &ClassifiedInvoice<'a>> {
        self.entries.iter().filter(|e| e.reason.generates())
    }

    /// Entries already covered by a platform note.
    pub fn already_issued(&self) -> impl Iterator<Item = &ClassifiedInvoice<'a>> {
        self.entries.iter().filter(|e| !e.reason.generates())
    }

    pub fn get(&self, number: &InvoiceNumber) -> Option<&ClassifiedInvoice<'a>> {
        self.entries.iter().find(|e| &e.invoice.number == number)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Everything the rules look at for one invoice.
struct Facts<'a> {
    invoice: &'a Invoice,
    platform_note: Option<&'a CreditNote>,
    dispute_lost: bool,
    refunded: i64,
    include_open: bool,
    policy: PartialRefundPolicy,
}

impl Facts<'_> {
    fn note_covers(&self) -> bool {
        match self.platform_note {
            None => false,
            Some(_) if self.refunded == 0 => true,
            Some(_) if self.policy == PartialRefundPolicy::TrustPlatform => true,
            Some(note) => note.amount >= self.refunded,
        }
    }
}

type Rule = (Reason, fn(&Facts<'_>) -> bool);

/// Ordered rule table, first match wins.
///
/// `AlreadyIssued` comes first: an invoice the platform already credited is
/// never numbered again, whatever its status.
static RULES: &[Rule] = &[
    (Reason::AlreadyIssued, |f| f.note_covers()),
    (Reason::Voided, |f| f.invoice.status == InvoiceStatus::Void),
    (Reason::Uncollectible, |f| {
        f.invoice.status == InvoiceStatus::Uncollectible
    }),
    (Reason::DisputeLost, |f| f.dispute_lost),
    (Reason::Refunded, |f| f.refunded > 0 && !f.note_covers()),
    (Reason::OpenIncluded, |f| {
        f.include_open && f.invoice.status == InvoiceStatus::Open
    }),
];

/// Classify every invoice of the window.
///
/// Fails with [`ConsistencyError::DuplicateInvoice`] when two records carry
/// one invoice number, with [`ConsistencyError::DuplicateCreditNote`] when
/// two credit notes claim one invoice, and with
/// [`ConsistencyError::CurrencyMismatch`] when a credit note's currency
/// differs from its invoice's.
pub fn classify<'a>(
    input: &ClassificationInput<'a>,
    options: &ClassifyOptions,
) -> Result<Classification<'a>, AvoirError> {
    index_invoices(input.invoices)?;
    let notes = index_credit_notes(input.credit_notes)?;
    let disputes: HashMap<&str, &Dispute> =
        input.disputes.iter().map(|d| (d.id.as_str(), d)).collect();
    let refunds: HashMap<&str, &Refund> =
        input.refunds.iter().map(|r| (r.id.as_str(), r)).collect();

    let mut entries = Vec::new();
    for invoice in input.invoices {
        if let Some(currency) = &options.currency {
            if !invoice.currency.eq_ignore_ascii_case(currency) {
                continue;
            }
        }
        if invoice.status == InvoiceStatus::Draft {
            continue;
        }

        let platform_note = notes.get(&invoice.number).copied();
        if let Some(note) = platform_note {
            if !note.currency.eq_ignore_ascii_case(&invoice.currency) {
                return Err(ConsistencyError::CurrencyMismatch {
                    invoice: invoice.number.to_string(),
                    credit_note: note.number.clone(),
                    invoice_currency: invoice.currency.clone(),
                    credit_note_currency: note.currency.clone(),
                }
                .into());
            }
        }

        let dispute_lost = invoice
            .dispute
            .as_deref()
            .and_then(|id| disputes.get(id))
            .is_some_and(|d| d.is_lost());
        let refunded = invoice
            .refunds
            .iter()
            .filter_map(|id| refunds.get(id.as_str()))
            .filter(|r| r.is_effective())
            .try_fold(0i64, |sum, r| sum.checked_add(r.amount))
            .ok_or_else(|| {
                ValidationError::new(
                    "invoice.refunds",
                    invoice.number.to_string(),
                    "refunded amounts overflow",
                )
            })?;

        let facts = Facts {
            invoice,
            platform_note,
            dispute_lost,
            refunded,
            include_open: options.include_open,
            policy: options.refund_policy,
        };
        let evidence: Vec<Reason> = RULES
            .iter()
            .filter(|(_, matches)| matches(&facts))
            .map(|(reason, _)| *reason)
            .collect();

        let Some(&reason) = evidence.first() else {
            continue;
        };
        tracing::debug!(
            invoice = %invoice.number,
            currency = %invoice.currency,
            %reason,
            "classified invoice"
        );
        entries.push(ClassifiedInvoice {
            invoice,
            reason,
            evidence,
            platform_note,
        });
    }

    entries.sort_by(|a, b| {
        a.invoice
            .currency
            .cmp(&b.invoice.currency)
            .then_with(|| a.invoice.number.cmp(&b.invoice.number))
    });

    let generated = entries.iter().filter(|e| e.reason.generates()).count();
    tracing::info!(
        invoices = input.invoices.len(),
        selected = entries.len(),
        to_generate = generated,
        already_issued = entries.len() - generated,
        "classified window"
    );
    Ok(Classification { entries })
}

fn index_credit_notes(
    notes: &[CreditNote],
) -> Result<BTreeMap<InvoiceNumber, &CreditNote>, AvoirError> {
    let mut index: BTreeMap<InvoiceNumber, &CreditNote> = BTreeMap::new();
    for note in notes {
        if let Some(first) = index.insert(note.invoice.clone(), note) {
            return Err(ConsistencyError::DuplicateCreditNote {
                invoice: note.invoice.to_string(),
                first: first.number.clone(),
                second: note.number.clone(),
            }
            .into());
        }
    }
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::InvoiceBuilder;
    use chrono::NaiveDate;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 20).unwrap()
    }

    fn invoice(number: &str, status: InvoiceStatus) -> Invoice {
        InvoiceBuilder::new(number, date())
            .status(status)
            .amounts(10_000, 2_100)
            .build()
            .unwrap()
    }

    fn note(invoice: &str, amount: i64) -> CreditNote {
        CreditNote {
            number: format!("CN-{invoice}"),
            invoice: InvoiceNumber::parse(invoice).unwrap(),
            currency: "EUR".into(),
            issue_date: date(),
            amount,
            reason: None,
            origin: CreditNoteOrigin::Platform,
        }
    }

    fn run<'a>(
        invoices: &'a [Invoice],
        refunds: &'a [Refund],
        notes: &'a [CreditNote],
        options: &ClassifyOptions,
    ) -> Classification<'a> {
        let input = ClassificationInput {
            invoices,
            disputes: &[],
            refunds,
            credit_notes: notes,
        };
        classify(&input, options).unwrap()
    }

    #[test]
    fn evidence_keeps_every_match() {
        let mut inv = invoice("25001-0001", InvoiceStatus::Void);
        inv.refunds.push("re_1".into());
        let refunds = [Refund {
            id: "re_1".into(),
            amount: 500,
            status: RefundStatus::Succeeded,
            created: date(),
        }];
        let invoices = [inv];
        let c = run(&invoices, &refunds, &[], &ClassifyOptions::default());
        let e = &c.entries()[0];
        assert_eq!(e.reason, Reason::Voided);
        assert_eq!(e.evidence, vec![Reason::Voided, Reason::Refunded]);
    }

    #[test]
    fn partial_platform_note_policy() {
        let mut inv = invoice("25001-0002", InvoiceStatus::Paid);
        inv.refunds.push("re_2".into());
        let refunds = [Refund {
            id: "re_2".into(),
            amount: 12_100,
            status: RefundStatus::Succeeded,
            created: date(),
        }];
        let notes = [note("25001-0002", 5_000)];
        let invoices = [inv];

        let regenerate = run(&invoices, &refunds, &notes, &ClassifyOptions::default());
        assert_eq!(regenerate.entries()[0].reason, Reason::Refunded);

        let trust = ClassifyOptions {
            refund_policy: PartialRefundPolicy::TrustPlatform,
            ..Default::default()
        };
        let trusted = run(&invoices, &refunds, &notes, &trust);
        assert_eq!(trusted.entries()[0].reason, Reason::AlreadyIssued);
    }

    #[test]
    fn failed_refunds_are_ignored() {
        let mut inv = invoice("25001-0003", InvoiceStatus::Paid);
        inv.refunds.push("re_3".into());
        let refunds = [Refund {
            id: "re_3".into(),
            amount: 100,
            status: RefundStatus::Failed,
            created: date(),
        }];
        let invoices = [inv];
        assert!(run(&invoices, &refunds, &[], &ClassifyOptions::default()).is_empty());
    }

    #[test]
    fn drafts_never_match() {
        let invoices = [invoice("25001-0004", InvoiceStatus::Draft)];
        let opts = ClassifyOptions {
            include_open: true,
            ..Default::default()
        };
        assert!(run(&invoices, &[], &[], &opts).is_empty());
    }

    #[test]
    fn refund_overflow_names_invoice() {
        let mut inv = invoice("25001-0006", InvoiceStatus::Paid);
        inv.refunds = vec!["re_a".into(), "re_b".into()];
        let refunds: Vec<Refund> = ["re_a", "re_b"]
            .into_iter()
            .map(|id| Refund {
                id: id.into(),
                amount: i64::MAX,
                status: RefundStatus::Succeeded,
                created: date(),
            })
            .collect();
        let invoices = [inv];
        let input = ClassificationInput {
            invoices: &invoices,
            refunds: &refunds,
            ..Default::default()
        };
        let err = classify(&input, &ClassifyOptions::default()).unwrap_err();
        let v = err.as_validation().unwrap();
        assert_eq!(v.field, "invoice.refunds");
        assert_eq!(v.value, "25001-0006");
    }

    #[test]
    fn duplicate_platform_notes_conflict() {
        let invoices = [invoice("25001-0005", InvoiceStatus::Paid)];
        let mut second = note("25001-0005", 100);
        second.number = "CN-other".into();
        let notes = [note("25001-0005", 100), second];
        let input = ClassificationInput {
            invoices: &invoices,
            disputes: &[],
            refunds: &[],
            credit_notes: &notes,
        };
        let err = classify(&input, &ClassifyOptions::default()).unwrap_err();
        assert!(matches!(
            err.as_consistency(),
            Some(ConsistencyError::DuplicateCreditNote { .. })
        ));
    }
}
