//! VAT treatment of an invoice by customer location and type.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::oss::OssTable;
use super::vat_number::vat_number_matches;
use crate::core::{AvoirError, Customer, Invoice, InvoiceNumber, ValidationError, normalize_country};

/// VAT treatment tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Treatment {
    /// Customer in the company's home country, taxed at the home rate.
    Domestic,
    /// Business customer in another OSS country; the buyer accounts for VAT.
    ReverseCharge,
    /// Consumer in another OSS country, taxed at the destination rate.
    Oss,
    /// Customer outside the OSS area.
    ExportExempt,
}

impl Treatment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Domestic => "domestic",
            Self::ReverseCharge => "reverse_charge",
            Self::Oss => "oss",
            Self::ExportExempt => "export_exempt",
        }
    }
}

impl std::fmt::Display for Treatment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inputs the decision was taken on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JurisdictionEvidence {
    pub customer_country: String,
    pub business: bool,
    pub home_country: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JurisdictionDecision {
    pub invoice: InvoiceNumber,
    pub currency: String,
    pub treatment: Treatment,
    /// Rate in percent.
    pub rate: Decimal,
    /// Legal mention to print, e.g. "reverse charge".
    pub note: Option<String>,
    /// Name of the customer country when it participates in OSS.
    pub oss_country: Option<String>,
    pub evidence: JurisdictionEvidence,
}

/// Net, tax and gross of one invoice under a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TaxedAmount {
    pub net: Decimal,
    pub tax: Decimal,
    pub gross: Decimal,
}

impl JurisdictionDecision {
    /// Tax `net` at the decided rate, rounded half away from zero to cents.
    ///
    /// ```
    /// use avoir::vat::*;
    /// # use avoir::core::*;
    /// # use chrono::NaiveDate;
    /// use rust_decimal_macros::dec;
    ///
    /// # let date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
    /// # let invoice = InvoiceBuilder::new("25003-0001", date).customer("cus_1").build().unwrap();
    /// let rules = JurisdictionRules::new("BE").unwrap();
    /// let customer = CustomerBuilder::new("cus_1", "Anna", "NL").build();
    /// let decision = resolve(&invoice, &customer, &rules).unwrap();
    /// assert_eq!(decision.treatment, Treatment::Oss);
    /// assert_eq!(decision.apply(dec!(100)).gross, dec!(121.00));
    /// ```
    pub fn apply(&self, net: Decimal) -> TaxedAmount {
        let tax = (net * self.rate / Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        TaxedAmount {
            net,
            tax,
            gross: net + tax,
        }
    }

    pub fn is_taxed(&self) -> bool {
        !self.rate.is_zero()
    }
}

/// The company's side of the decision: where it sits and which table applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JurisdictionRules {
    home_country: String,
    home_rate: Option<Decimal>,
    oss: OssTable,
}

impl JurisdictionRules {
    /// Rules for a company in `home_country`, with the default OSS table.
    pub fn new(home_country: &str) -> Result<Self, AvoirError> {
        Ok(Self {
            home_country: normalize_country("company.country", home_country)?,
            home_rate: None,
            oss: OssTable::default(),
        })
    }

    /// Override the domestic rate instead of taking it from the OSS table.
    pub fn with_home_rate(mut self, rate: Decimal) -> Self {
        self.home_rate = Some(rate);
        self
    }

    pub fn with_oss(mut self, oss: OssTable) -> Self {
        self.oss = oss;
        self
    }

    pub fn home_country(&self) -> &str {
        &self.home_country
    }

    pub fn oss(&self) -> &OssTable {
        &self.oss
    }

    /// The domestic standard rate.
    pub fn home_rate(&self) -> Result<Decimal, ValidationError> {
        self.home_rate
            .or_else(|| self.oss.get(&self.home_country).map(|c| c.standard_rate))
            .ok_or_else(|| {
                ValidationError::new(
                    "home_rate",
                    &self.home_country,
                    "no standard rate configured for the home country",
                )
            })
    }
}

/// Whether `customer` counts as a business: it carries a VAT number shaped
/// like one issued by its country.
pub fn is_business(customer: &Customer, country: &str) -> bool {
    customer
        .vat_number
        .as_deref()
        .is_some_and(|vat| vat_number_matches(country, vat))
}

struct Facts<'a> {
    country: &'a str,
    home: &'a str,
    business: bool,
    in_oss: bool,
}

type Rule = (Treatment, fn(&Facts<'_>) -> bool);

/// First match wins.
static RULES: &[Rule] = &[
    (Treatment::Domestic, |f| f.country == f.home),
    (Treatment::ReverseCharge, |f| f.business && f.in_oss),
    (Treatment::Oss, |f| !f.business && f.in_oss),
    (Treatment::ExportExempt, |f| !f.in_oss),
];

/// Decide the VAT treatment of `invoice`, billed to `customer`.
///
/// Fails when the customer country is not an ISO 3166-1 code, or when the
/// sale is domestic and no home rate is known.
pub fn resolve(
    invoice: &Invoice,
    customer: &Customer,
    rules: &JurisdictionRules,
) -> Result<JurisdictionDecision, AvoirError> {
    let country = normalize_country("customer.country", &customer.country).map_err(|mut e| {
        e.message = format!(
            "customer {} of invoice {}: {}",
            customer.id, invoice.number, e.message
        );
        e
    })?;
    let business = is_business(customer, &country);
    let oss_entry = rules.oss.get(&country);
    let facts = Facts {
        country: &country,
        home: &rules.home_country,
        business,
        in_oss: oss_entry.is_some(),
    };

    let treatment = RULES
        .iter()
        .find(|(_, matches)| matches(&facts))
        .map(|(t, _)| *t)
        .unwrap_or(Treatment::ExportExempt);

    let (rate, note) = match treatment {
        Treatment::Domestic => (rules.home_rate()?, None),
        Treatment::ReverseCharge => (Decimal::ZERO, Some("reverse charge".to_string())),
        Treatment::Oss => (
            oss_entry.map(|c| c.standard_rate).unwrap_or(Decimal::ZERO),
            None,
        ),
        Treatment::ExportExempt => (Decimal::ZERO, None),
    };

    tracing::debug!(
        invoice = %invoice.number,
        country = %country,
        business,
        treatment = %treatment,
        rate = %rate,
        "resolved jurisdiction"
    );

    Ok(JurisdictionDecision {
        invoice: invoice.number.clone(),
        currency: invoice.currency.clone(),
        treatment,
        rate,
        note,
        oss_country: oss_entry.map(|c| c.name.clone()),
        evidence: JurisdictionEvidence {
            customer_country: country,
            business,
            home_country: rules.home_country.clone(),
        },
    })
}
