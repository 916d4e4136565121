//! # avoir
//!
//! Credit notes, VAT jurisdiction and payout reports for billing records
//! fetched from a payment platform.
//!
//! Everything here is a pure function over one window of records: no
//! network I/O, no rendering, no state kept between runs. Numbering state
//! is threaded through [`NumberingPlan`] and [`NumberingOutcome`].
//! Amounts arrive in minor units and are converted to [`rust_decimal::Decimal`],
//! never floating point.
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::NaiveDate;
//! use avoir::core::*;
//!
//! let issued = NaiveDate::from_ymd_opt(2025, 3, 31).unwrap();
//! let invoices = vec![
//!     InvoiceBuilder::new("25003-0009", issued)
//!         .status(InvoiceStatus::Void)
//!         .add_line("Pro plan", 1, 4_900)
//!         .build()
//!         .unwrap(),
//!     InvoiceBuilder::new("25003-0010", issued)
//!         .status(InvoiceStatus::Void)
//!         .add_line("Pro plan", 1, 4_900)
//!         .build()
//!         .unwrap(),
//! ];
//! let input = ClassificationInput { invoices: &invoices, ..Default::default() };
//! let classification = classify(&input, &ClassifyOptions::default()).unwrap();
//!
//! let plan = NumberingPlan::new(issued)
//!     .skip(SkipSet::parse("25003-0010").unwrap())
//!     .sequence("EUR", SequenceState::starting_at(12));
//! let outcome = assign_numbers(&classification, &plan).unwrap();
//!
//! assert_eq!(outcome.credit_notes[0].number, "S25001-0012");
//! assert_eq!(outcome.skipped.len(), 1);
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `core` | Records, skip specs, classification, numbering, credit note bundles |
//! | `vat` | OSS rate table, VAT number shapes, jurisdiction resolver |
//! | `payout` | Payout linking, fee categories |
//! | `report` | Per-invoice and per-payout-item report rows, VAT per country |
//! | `all` (default) | Everything |

#[cfg(feature = "core")]
pub mod core;

#[cfg(feature = "vat")]
pub mod vat;

#[cfg(feature = "payout")]
pub mod payout;

#[cfg(feature = "report")]
pub mod report;

// Re-export core types at crate root for convenience
#[cfg(feature = "core")]
pub use crate::core::*;
