use std::collections::{BTreeMap, BTreeSet};
use std::ops::RangeInclusive;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::classify::Classification;
use super::currencies::CurrencyTable;
use super::error::{AvoirError, ValidationError};
use super::skip::SkipSet;
use super::types::{CreditNote, CreditNoteOrigin, InvoiceNumber};

/// Generated credit note number.
///
/// Format `S{YY}{CC}1-{NNNN}`: two-digit issue year, two-digit currency
/// index, the constant `1` (platform-billed series), then the sequence,
/// zero-padded to at least four digits. `S25001-0042` is the 42nd EUR
/// credit note of 2025.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CreditNoteNumber {
    pub year: u8,
    pub currency_index: u8,
    pub sequence: u32,
}

impl CreditNoteNumber {
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let err = |message: &str| ValidationError::new("credit_note_number", s, message);
        let rest = s
            .trim()
            .strip_prefix('S')
            .ok_or_else(|| err("must start with 'S'"))?;
        let (series, seq) = rest
            .split_once('-')
            .ok_or_else(|| err("expected SYYCC1-NNNN"))?;
        if series.len() != 5 || !series.chars().all(|c| c.is_ascii_digit()) {
            return Err(err("series must be five digits"));
        }
        if !series.ends_with('1') {
            return Err(err("series must end in 1"));
        }
        if seq.is_empty() || !seq.chars().all(|c| c.is_ascii_digit()) {
            return Err(err("sequence must be numeric"));
        }
        Ok(Self {
            year: series[0..2].parse().map_err(|_| err("bad year"))?,
            currency_index: series[2..4].parse().map_err(|_| err("bad currency index"))?,
            sequence: seq.parse().map_err(|_| err("sequence out of range"))?,
        })
    }
}

impl std::fmt::Display for CreditNoteNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "S{:02}{:02}1-{:04}",
            self.year, self.currency_index, self.sequence
        )
    }
}

impl FromStr for CreditNoteNumber {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Numbering state of one currency, threaded from one run to the next.
///
/// `next` is the lowest candidate; `reserved` holds numbers that must never
/// be emitted (consumed by earlier notes or excluded by the operator).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceState {
    next: u32,
    reserved: BTreeSet<u32>,
}

impl SequenceState {
    /// Start numbering at `first` (the configured starting index).
    pub fn starting_at(first: u32) -> Self {
        Self {
            next: first,
            reserved: BTreeSet::new(),
        }
    }

    pub fn reserve(mut self, number: u32) -> Self {
        self.reserved.insert(number);
        self
    }

    pub fn reserve_range(mut self, range: RangeInclusive<u32>) -> Self {
        self.reserved.extend(range);
        self
    }

    /// Reserve the sequence of every number belonging to `year` and `currency_index`.
    pub fn consume_existing<'a>(
        mut self,
        numbers: impl IntoIterator<Item = &'a CreditNoteNumber>,
        year: u8,
        currency_index: u8,
    ) -> Self {
        self.reserved.extend(
            numbers
                .into_iter()
                .filter(|n| n.year == year && n.currency_index == currency_index)
                .map(|n| n.sequence),
        );
        self
    }

    /// The number the next assignment would take, without consuming it.
    pub fn peek(&self) -> Option<u32> {
        (self.next..=u32::MAX).find(|n| !self.reserved.contains(n))
    }

    /// Take the next free number; the counter moves strictly past it.
    pub fn take(&mut self) -> Option<u32> {
        let n = self.peek()?;
        self.reserved.insert(n);
        self.next = n.checked_add(1).unwrap_or(u32::MAX);
        Some(n)
    }

    pub fn next_raw(&self) -> u32 {
        self.next
    }

    pub fn is_reserved(&self, number: u32) -> bool {
        self.reserved.contains(&number)
    }
}

/// Parameters of one numbering run.
#[derive(Debug, Clone)]
pub struct NumberingPlan {
    /// Issue date of the generated notes; its year goes into the number.
    pub issue_date: NaiveDate,
    pub currencies: CurrencyTable,
    /// Invoices to leave out of numbering.
    pub skip: SkipSet,
    /// Numbering state per currency code.
    pub sequences: BTreeMap<String, SequenceState>,
}

impl NumberingPlan {
    pub fn new(issue_date: NaiveDate) -> Self {
        Self {
            issue_date,
            currencies: CurrencyTable::default(),
            skip: SkipSet::new(),
            sequences: BTreeMap::new(),
        }
    }

    pub fn currencies(mut self, currencies: CurrencyTable) -> Self {
        self.currencies = currencies;
        self
    }

    pub fn skip(mut self, skip: SkipSet) -> Self {
        self.skip = skip;
        self
    }

    pub fn sequence(mut self, currency: &str, state: SequenceState) -> Self {
        self.sequences.insert(currency.to_ascii_uppercase(), state);
        self
    }

    /// Two-digit year of the issue date.
    pub fn year(&self) -> u8 {
        self.issue_date.year().rem_euclid(100) as u8
    }
}

/// Result of a numbering run.
#[derive(Debug, Clone)]
pub struct NumberingOutcome {
    /// Generated notes, in assignment order.
    pub credit_notes: Vec<CreditNote>,
    /// Eligible invoices left out because they are in the skip set.
    pub skipped: Vec<InvoiceNumber>,
    /// State to hand to the next run.
    pub sequences: BTreeMap<String, SequenceState>,
}

/// Assign credit note numbers to every invoice of `classification` that
/// needs one, in the classification's order.
///
/// All currencies are checked before anything is assigned, so a missing
/// currency or starting index fails the run as a whole.
pub fn assign_numbers(
    classification: &Classification<'_>,
    plan: &NumberingPlan,
) -> Result<NumberingOutcome, AvoirError> {
    let mut sequences = plan.sequences.clone();
    for entry in classification.to_generate() {
        if plan.skip.contains(&entry.invoice.number) {
            continue;
        }
        let code = &entry.invoice.currency;
        plan.currencies.get(code)?;
        if !sequences.contains_key(&code.to_ascii_uppercase()) {
            return Err(ValidationError::new(
                "starting_index",
                code,
                "no starting index configured for currency",
            )
            .into());
        }
    }

    let year = plan.year();
    let mut credit_notes = Vec::new();
    let mut skipped = Vec::new();

    for entry in classification.to_generate() {
        let invoice = entry.invoice;
        if plan.skip.contains(&invoice.number) {
            tracing::debug!(invoice = %invoice.number, "skipped by operator");
            skipped.push(invoice.number.clone());
            continue;
        }
        let currency = plan.currencies.get(&invoice.currency)?;
        let state = sequences
            .get_mut(&currency.code)
            .ok_or_else(|| ValidationError::new("starting_index", &currency.code, "missing"))?;
        let sequence = state.take().ok_or_else(|| {
            ValidationError::new("starting_index", &currency.code, "sequence exhausted")
        })?;
        let number = CreditNoteNumber {
            year,
            currency_index: currency.index,
            sequence,
        };
        tracing::debug!(invoice = %invoice.number, %number, reason = %entry.reason, "assigned");
        credit_notes.push(CreditNote {
            number: number.to_string(),
            invoice: invoice.number.clone(),
            currency: currency.code.clone(),
            issue_date: plan.issue_date,
            amount: invoice.total,
            reason: entry.reason.credit_note_reason(),
            origin: CreditNoteOrigin::Generated,
        });
    }

    tracing::info!(
        generated = credit_notes.len(),
        skipped = skipped.len(),
        first = credit_notes.first().map(|n| n.number.as_str()).unwrap_or("-"),
        last = credit_notes.last().map(|n| n.number.as_str()).unwrap_or("-"),
        "numbered credit notes"
    );
    Ok(NumberingOutcome {
        credit_notes,
        skipped,
        sequences,
    })
}
