//! Accounting account labels for invoice revenue.

use crate::core::Customer;
use crate::vat::JurisdictionDecision;

/// Account an invoice is booked on.
///
/// Business customers get their own account, named after them. Consumers
/// are booked per OSS country (`OSS Germany`), or on `OSS EXTRACOM` when
/// they live outside the OSS area.
pub fn accounting_account(decision: &JurisdictionDecision, customer: &Customer) -> String {
    if decision.evidence.business {
        return customer.name.clone();
    }
    match &decision.oss_country {
        Some(name) => format!("OSS {name}"),
        None => "OSS EXTRACOM".to_string(),
    }
}
