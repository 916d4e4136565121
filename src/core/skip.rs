//! Operator-supplied list of invoices to leave out of credit note numbering.
//!
//! Syntax: comma-separated tokens, each a single invoice number or an
//! inclusive range `START:END` of numbers sharing a prefix:
//!
//! ```text
//! 25001-0001,25001-0010:25001-0020,25001-0030
//! ```
//!
//! Overlapping tokens are simply unioned.

use std::collections::BTreeSet;
use std::str::FromStr;

use super::error::{AvoirError, ValidationError};
use super::types::InvoiceNumber;

/// Largest range a single token may expand to.
pub const MAX_RANGE_LEN: u32 = 100_000;

/// Set of invoice numbers excluded from numbering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkipSet {
    numbers: BTreeSet<InvoiceNumber>,
}

impl SkipSet {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a skip spec. Empty (or all-whitespace) input yields an empty set.
    ///
    /// The first malformed token fails the whole parse; nothing is returned
    /// for the tokens before it.
    pub fn parse(spec: &str) -> Result<Self, AvoirError> {
        let mut set = Self::new();
        if spec.trim().is_empty() {
            return Ok(set);
        }
        for raw in spec.split(',') {
            let token = raw.trim();
            if token.is_empty() {
                return Err(malformed(raw, "empty token"));
            }
            let parts: Vec<&str> = token.split(':').collect();
            match parts.as_slice() {
                [single] => {
                    set.numbers.insert(parse_id(token, single)?);
                }
                [start, end] => {
                    let start = parse_id(token, start)?;
                    let end = parse_id(token, end)?;
                    set.insert_range(token, &start, &end)?;
                }
                _ => return Err(malformed(token, "a range has exactly one ':'")),
            }
        }
        tracing::debug!(count = set.len(), "parsed skip spec");
        Ok(set)
    }

    fn insert_range(
        &mut self,
        token: &str,
        start: &InvoiceNumber,
        end: &InvoiceNumber,
    ) -> Result<(), AvoirError> {
        if start.prefix() != end.prefix() {
            return Err(malformed(token, "range bounds must share a prefix"));
        }
        if start.sequence() > end.sequence() {
            return Err(malformed(token, "range start is after range end"));
        }
        if end.sequence() - start.sequence() >= MAX_RANGE_LEN {
            return Err(malformed(
                token,
                format!("range covers more than {MAX_RANGE_LEN} invoices"),
            ));
        }
        for seq in start.sequence()..=end.sequence() {
            self.numbers.insert(start.with_sequence(seq));
        }
        Ok(())
    }

    /// Add one invoice; `false` if it was already skipped.
    pub fn insert(&mut self, number: InvoiceNumber) -> bool {
        self.numbers.insert(number)
    }

    /// Whether `number` is skipped, compared numerically.
    pub fn contains(&self, number: &InvoiceNumber) -> bool {
        self.numbers.contains(number)
    }

    /// Number of distinct skipped invoices.
    pub fn len(&self) -> usize {
        self.numbers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.numbers.is_empty()
    }

    /// Skipped invoices in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = &InvoiceNumber> {
        self.numbers.iter()
    }
}

fn parse_id(token: &str, part: &str) -> Result<InvoiceNumber, AvoirError> {
    InvoiceNumber::parse(part).map_err(|e| malformed(token, e.message))
}

fn malformed(token: &str, message: impl Into<String>) -> AvoirError {
    ValidationError::new("skip_spec", token.trim(), message).into()
}

impl FromStr for SkipSet {
    type Err = AvoirError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Canonical form: ascending, runs of consecutive numbers written as ranges.
impl std::fmt::Display for SkipSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut runs: Vec<(&InvoiceNumber, &InvoiceNumber)> = Vec::new();
        for n in &self.numbers {
            if let Some((_, last)) = runs.last_mut() {
                let follows = last.sequence().checked_add(1) == Some(n.sequence());
                if last.prefix() == n.prefix() && follows {
                    *last = n;
                    continue;
                }
            }
            runs.push((n, n));
        }
        for (i, (start, end)) in runs.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            if start == end {
                write!(f, "{start}")?;
            } else {
                write!(f, "{start}:{end}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(s: &str) -> InvoiceNumber {
        InvoiceNumber::parse(s).unwrap()
    }

    #[test]
    fn empty_input() {
        assert!(SkipSet::parse("").unwrap().is_empty());
        assert!(SkipSet::parse("   ").unwrap().is_empty());
    }

    #[test]
    fn singles_and_ranges() {
        let set = SkipSet::parse("25001-0001, 25001-0010:25001-0012 ,25001-0030").unwrap();
        assert_eq!(set.len(), 5);
        assert!(set.contains(&n("25001-0001")));
        assert!(set.contains(&n("25001-0011")));
        assert!(set.contains(&n("25001-0030")));
        assert!(!set.contains(&n("25001-0013")));
    }

    #[test]
    fn range_crosses_digit_boundary_numerically() {
        let set = SkipSet::parse("25001-0009:25001-0010").unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.contains(&n("25001-0009")));
        assert!(set.contains(&n("25001-0010")));
    }

    #[test]
    fn overlaps_union() {
        let set = SkipSet::parse("25001-0005,25001-0003:25001-0006,25001-0004").unwrap();
        assert_eq!(set.len(), 4);
    }

    #[test]
    fn malformed_tokens_name_the_token() {
        let cases = [
            ("25001-0001,,25001-0002", ""),
            ("25001-0001:25001-0002:25001-0003", "25001-0001:25001-0002:25001-0003"),
            ("25001-00x1", "25001-00x1"),
            ("25001-0005:25001-0001", "25001-0005:25001-0001"),
            ("25001-0001:25002-0003", "25001-0001:25002-0003"),
            ("25001-0001:", "25001-0001:"),
        ];
        for (spec, token) in cases {
            let err = SkipSet::parse(spec).unwrap_err();
            let v = err.as_validation().expect("validation error");
            assert_eq!(v.field, "skip_spec");
            assert_eq!(v.value, token, "spec {spec:?}");
        }
    }

    #[test]
    fn oversized_range_is_rejected() {
        assert!(SkipSet::parse("25001-0:25001-999999").is_err());
    }

    #[test]
    fn canonical_display() {
        let set = SkipSet::parse("25001-0012,25001-0010,25001-0011,25001-0020,24001-0001").unwrap();
        assert_eq!(set.to_string(), "24001-0001,25001-0010:25001-0012,25001-0020");
        assert_eq!(SkipSet::parse(&set.to_string()).unwrap(), set);
    }
}
