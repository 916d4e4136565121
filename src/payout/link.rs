//! Match payouts to the invoices they settle.

use std::collections::HashMap;

use serde::Serialize;

use super::Payout;
use crate::core::{
    AvoirError, ConsistencyError, Invoice, InvoiceNumber, ValidationError, index_invoices,
};

/// A payout and the invoices it settles, in the payout's own order.
#[derive(Debug, Clone, Serialize)]
pub struct LinkedPayout<'a> {
    pub payout: &'a Payout,
    pub invoices: Vec<&'a Invoice>,
}

/// A settlement reference that matches no invoice of the window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnknownRef {
    pub payout: String,
    pub reference: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PayoutLinks<'a> {
    pub payouts: Vec<LinkedPayout<'a>>,
    /// Invoices no payout settles yet, ordered by currency then number.
    pub unsettled: Vec<&'a Invoice>,
    pub unknown_refs: Vec<UnknownRef>,
    #[serde(skip)]
    by_invoice: HashMap<InvoiceNumber, usize>,
}

impl<'a> PayoutLinks<'a> {
    /// The payout that settled `invoice`, if any.
    pub fn payout_for(&self, invoice: &InvoiceNumber) -> Option<&'a Payout> {
        self.by_invoice.get(invoice).map(|&i| self.payouts[i].payout)
    }

    pub fn is_settled(&self, invoice: &InvoiceNumber) -> bool {
        self.by_invoice.contains_key(invoice)
    }
}

/// Link every payout to the invoices named by its settlement references.
///
/// A reference matches an invoice by number or by one of the invoice's
/// settlement references. An invoice claimed twice, by two payouts or twice
/// by the same one, fails with [`ConsistencyError::DuplicateSettlement`]; an
/// invoice number carried by two records fails with
/// [`ConsistencyError::DuplicateInvoice`].
pub fn link_payouts<'a>(
    invoices: &'a [Invoice],
    payouts: &'a [Payout],
) -> Result<PayoutLinks<'a>, AvoirError> {
    let refs = reference_index(invoices)?;

    let mut linked = Vec::with_capacity(payouts.len());
    let mut by_invoice: HashMap<InvoiceNumber, usize> = HashMap::new();
    let mut unknown_refs = Vec::new();

    for (idx, payout) in payouts.iter().enumerate() {
        let mut settled = Vec::new();
        for reference in &payout.settles {
            let Some(&invoice) = refs.get(reference) else {
                tracing::debug!(
                    payout = %payout.id,
                    reference = %reference,
                    "unknown settlement reference"
                );
                unknown_refs.push(UnknownRef {
                    payout: payout.id.clone(),
                    reference: reference.clone(),
                });
                continue;
            };
            if let Some(&first) = by_invoice.get(&invoice.number) {
                return Err(ConsistencyError::DuplicateSettlement {
                    invoice: invoice.number.to_string(),
                    first_payout: payouts[first].id.clone(),
                    second_payout: payout.id.clone(),
                }
                .into());
            }
            by_invoice.insert(invoice.number.clone(), idx);
            settled.push(invoice);
        }
        tracing::debug!(payout = %payout.id, invoices = settled.len(), "linked payout");
        linked.push(LinkedPayout {
            payout,
            invoices: settled,
        });
    }

    let mut unsettled: Vec<&Invoice> = invoices
        .iter()
        .filter(|i| !by_invoice.contains_key(&i.number))
        .collect();
    unsettled.sort_by(|a, b| (&a.currency, &a.number).cmp(&(&b.currency, &b.number)));

    tracing::info!(
        payouts = linked.len(),
        settled = by_invoice.len(),
        unsettled = unsettled.len(),
        unknown = unknown_refs.len(),
        "payouts linked"
    );

    Ok(PayoutLinks {
        payouts: linked,
        unsettled,
        unknown_refs,
        by_invoice,
    })
}

/// Map every invoice number and settlement reference to its invoice.
///
/// Fails when two records share a number or a reference.
pub(crate) fn reference_index(
    invoices: &[Invoice],
) -> Result<HashMap<String, &Invoice>, AvoirError> {
    let mut refs: HashMap<String, &Invoice> = index_invoices(invoices)?
        .into_iter()
        .map(|(number, invoice)| (number.to_string(), invoice))
        .collect();
    for invoice in invoices {
        for reference in &invoice.settlement_refs {
            if let Some(other) = refs.insert(reference.clone(), invoice) {
                if other.number != invoice.number {
                    return Err(ValidationError::new(
                        "invoice.settlement_refs",
                        reference,
                        format!(
                            "reference is carried by invoices {} and {}",
                            other.number, invoice.number
                        ),
                    )
                    .into());
                }
            }
        }
    }
    Ok(refs)
}
