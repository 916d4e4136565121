use thiserror::Error;

/// Errors produced by classification, numbering, jurisdiction and reporting.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum AvoirError {
    /// Malformed input: skip spec, unknown country or currency, inconsistent amounts.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Records that contradict each other and need manual resolution.
    #[error("consistency error: {0}")]
    Consistency(#[from] ConsistencyError),
}

impl AvoirError {
    /// Shorthand for a [`ValidationError`] wrapped in [`AvoirError::Validation`].
    pub fn validation(
        field: impl Into<String>,
        value: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Validation(ValidationError::new(field, value, message))
    }

    /// The validation error, if this is one.
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation(e) => Some(e),
            Self::Consistency(_) => None,
        }
    }

    /// The consistency error, if this is one.
    pub fn as_consistency(&self) -> Option<&ConsistencyError> {
        match self {
            Self::Consistency(e) => Some(e),
            Self::Validation(_) => None,
        }
    }
}

/// A rejected input value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Name of the input that was rejected (e.g. "skip_spec", "customer.country").
    pub field: String,
    /// The offending token or identifier, verbatim.
    pub value: String,
    /// Human-readable error description.
    pub message: String,
}

impl ValidationError {
    /// Reject `value` of input `field` with `message`.
    pub fn new(
        field: impl Into<String>,
        value: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} '{}': {}", self.field, self.value, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Two or more records disagree about the same invoice.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ConsistencyError {
    #[error("invoice {invoice} is settled by payout {first_payout} and by payout {second_payout}")]
    DuplicateSettlement {
        invoice: String,
        first_payout: String,
        second_payout: String,
    },

    #[error("invoice {invoice} appears twice in the window, as {first_id} and {second_id}")]
    DuplicateInvoice {
        invoice: String,
        first_id: String,
        second_id: String,
    },

    #[error("invoice {invoice} is claimed by credit notes {first} and {second}")]
    DuplicateCreditNote {
        invoice: String,
        first: String,
        second: String,
    },

    #[error(
        "credit note {credit_note} is in {credit_note_currency} \
         but invoice {invoice} is in {invoice_currency}"
    )]
    CurrencyMismatch {
        invoice: String,
        credit_note: String,
        invoice_currency: String,
        credit_note_currency: String,
    },
}
