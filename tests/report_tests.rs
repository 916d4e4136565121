#![cfg(feature = "report")]

use avoir::core::*;
use avoir::payout::*;
use avoir::report::*;
use avoir::vat::*;
use chrono::NaiveDate;
use rust_decimal_macros::dec;

fn date(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
}

struct Window {
    invoices: Vec<Invoice>,
    customers: Vec<Customer>,
    payouts: Vec<Payout>,
    rules: JurisdictionRules,
    currencies: CurrencyTable,
}

impl Window {
    fn input(&self) -> ReportInput<'_> {
        ReportInput {
            invoices: &self.invoices,
            customers: &self.customers,
            payouts: &self.payouts,
            rules: &self.rules,
            currencies: &self.currencies,
        }
    }
}

fn taxed(number: &str, customer: &str, net: i64, rate: u32, charge: &str) -> Invoice {
    let tax = net * i64::from(rate) / 100;
    InvoiceBuilder::new(number, date(1))
        .customer(customer)
        .add_line("Pro plan", 1, net)
        .amounts(net, tax)
        .tax_rate(rust_decimal::Decimal::from(rate))
        .settlement_ref(charge)
        .build()
        .unwrap()
}

fn window() -> Window {
    let invoices = vec![
        taxed("25006-0003", "cus_be", 10_000, 21, "ch_3"),
        taxed("25006-0001", "cus_nl", 10_000, 21, "ch_1"),
        taxed("25006-0002", "cus_de_b2b", 10_000, 0, "ch_2"),
        taxed("25006-0004", "cus_nl", 5_000, 21, "ch_4"),
        InvoiceBuilder::new("25006-0005", date(2))
            .customer("cus_us")
            .currency("USD")
            .add_line("Pro plan", 1, 9_900)
            .status(InvoiceStatus::Void)
            .build()
            .unwrap(),
    ];
    let customers = vec![
        CustomerBuilder::new("cus_be", "Jan", "BE").build(),
        CustomerBuilder::new("cus_nl", "Anna", "NL").email("anna@example.nl").build(),
        CustomerBuilder::new("cus_de_b2b", "Muster GmbH", "DE")
            .vat_number("DE123456789")
            .build(),
        CustomerBuilder::new("cus_us", "Bob", "US").build(),
    ];
    let payouts = vec![
        Payout::new("po_1", date(5), "EUR").settles("ch_1").settles("ch_2"),
        Payout::new("po_2", date(12), "EUR").settles("ch_3").settles("ch_gone"),
    ];
    Window {
        invoices,
        customers,
        payouts,
        rules: JurisdictionRules::new("BE").unwrap(),
        currencies: CurrencyTable::default(),
    }
}

#[test]
fn one_row_per_invoice_in_currency_then_number_order() {
    let w = window();
    let report = aggregate(&w.input()).unwrap();
    let order: Vec<String> = report
        .rows
        .iter()
        .map(|r| format!("{} {}", r.currency, r.invoice))
        .collect();
    assert_eq!(
        order,
        [
            "EUR 25006-0001",
            "EUR 25006-0002",
            "EUR 25006-0003",
            "EUR 25006-0004",
            "USD 25006-0005",
        ]
    );
}

#[test]
fn rows_carry_decision_amounts_and_payout() {
    let w = window();
    let report = aggregate(&w.input()).unwrap();
    let nl = &report.rows[0];
    assert_eq!(nl.treatment, Treatment::Oss);
    assert_eq!(nl.customer_email.as_deref(), Some("anna@example.nl"));
    assert_eq!((nl.net, nl.tax, nl.gross), (dec!(100), dec!(21), dec!(121)));
    assert_eq!(nl.payout.as_deref(), Some("po_1"));
    assert_eq!(nl.payout_arrival, Some(date(5)));

    let b2b = &report.rows[1];
    assert_eq!(b2b.treatment, Treatment::ReverseCharge);
    assert!(b2b.business);
    assert_eq!(b2b.accounting_account, "Muster GmbH");
    assert!(b2b.tax_matches());

    let be = &report.rows[2];
    assert_eq!(be.treatment, Treatment::Domestic);
    assert_eq!(be.accounting_account, "OSS Belgium");
    assert_eq!(be.payout.as_deref(), Some("po_2"));

    assert_eq!(report.unsettled().count(), 2);
    assert_eq!(report.unknown_refs[0].reference, "ch_gone");
}

#[test]
fn tax_mismatch_is_flagged() {
    let mut w = window();
    // billed at the home rate instead of the destination rate
    w.customers[1].country = "HU".into();
    let report = aggregate(&w.input()).unwrap();
    let hu = &report.rows[0];
    assert_eq!(hu.rate, dec!(27));
    assert_eq!(hu.expected_tax, dec!(27));
    assert!(!hu.tax_matches());
}

#[test]
fn vat_per_country_from_rows() {
    let w = window();
    let report = aggregate(&w.input()).unwrap();
    let totals = vat_per_country(&report.rows);

    let nl = totals[&("NL".to_string(), "EUR".to_string())];
    assert_eq!(nl.invoices, 2);
    assert_eq!(nl.excluding_tax, dec!(150));
    assert_eq!(nl.including_tax, dec!(181.50));
    assert!(totals.contains_key(&("BE".to_string(), "EUR".to_string())));
    // untaxed reverse charge and voided export are left out
    assert!(!totals.contains_key(&("DE".to_string(), "EUR".to_string())));
    assert!(!totals.contains_key(&("US".to_string(), "USD".to_string())));
}

#[test]
fn double_settlement_fails_report() {
    let mut w = window();
    w.payouts.push(Payout::new("po_3", date(20), "EUR").settles("25006-0001"));
    let err = aggregate(&w.input()).unwrap_err();
    assert!(err.as_consistency().is_some());
}

#[test]
fn unknown_country_fails_report() {
    let mut w = window();
    w.customers[0].country = "XX".into();
    let err = aggregate(&w.input()).unwrap_err();
    assert_eq!(err.as_validation().unwrap().field, "customer.country");
}

#[test]
fn repeated_invoice_record_fails_report() {
    let mut w = window();
    let mut copy = w.invoices[1].clone();
    copy.id = "in_page_two".into();
    w.invoices.push(copy);
    let err = aggregate(&w.input()).unwrap_err();
    match err.as_consistency() {
        Some(ConsistencyError::DuplicateInvoice {
            invoice,
            first_id,
            second_id,
        }) => {
            assert_eq!(invoice, "25006-0001");
            assert_eq!(first_id, "25006-0001");
            assert_eq!(second_id, "in_page_two");
        }
        other => panic!("unexpected {other:?}"),
    }
}

fn payout_item(
    id: &str,
    kind: BalanceKind,
    description: &str,
    gross: i64,
    net: i64,
) -> PayoutItem {
    PayoutItem {
        id: id.into(),
        kind,
        description: description.into(),
        gross,
        net,
        created: date(4),
        source: None,
    }
}

fn window_with_items() -> Window {
    let mut w = window();
    let mut charge = payout_item(
        "txn_1",
        BalanceKind::Charge,
        "Subscription creation",
        12_100,
        11_800,
    );
    charge.source = Some("ch_1".into());
    let mut late = payout_item(
        "txn_4",
        BalanceKind::Charge,
        "Subscription update",
        12_100,
        11_800,
    );
    late.created = date(20);
    w.payouts[0] = w.payouts[0]
        .clone()
        .item(charge)
        .item(payout_item(
            "txn_2",
            BalanceKind::StripeFee,
            "Billing - Usage Fee",
            -250,
            -250,
        ))
        .item(payout_item(
            "txn_3",
            BalanceKind::Payout,
            "STRIPE PAYOUT",
            -11_550,
            -11_550,
        ))
        .item(late);
    w
}

#[test]
fn payout_items_join_their_invoice() {
    let w = window_with_items();
    let rows = payout_item_rows(&w.input(), date(1), date(10)).unwrap();
    let ids: Vec<&str> = rows.iter().map(|r| r.item.as_str()).collect();
    assert_eq!(ids, ["txn_1", "txn_2"]);

    let charge = &rows[0];
    let invoice = charge.invoice.as_ref().map(|n| n.to_string());
    assert_eq!(invoice.as_deref(), Some("25006-0001"));
    assert_eq!(charge.customer_email.as_deref(), Some("anna@example.nl"));
    assert_eq!(charge.customer_country.as_deref(), Some("NL"));
    assert_eq!(charge.accounting_account.as_deref(), Some("OSS Netherlands"));
    assert_eq!(charge.category, FeeCategory::ProcessingCard);
    assert_eq!(charge.category_amount, dec!(3.00));
    assert_eq!((charge.gross, charge.net), (dec!(121.00), dec!(118.00)));
    assert_eq!(charge.payout, "po_1");
    assert_eq!(charge.payout_arrival, date(5));

    let fee = &rows[1];
    assert!(fee.invoice.is_none());
    assert!(fee.accounting_account.is_none());
    assert_eq!(fee.category, FeeCategory::Billing);
    assert_eq!(fee.category_amount, dec!(2.50));
}

#[test]
fn payout_item_rows_fail_on_unknown_category() {
    let mut w = window_with_items();
    w.payouts[1] = w.payouts[1].clone().item(payout_item(
        "txn_9",
        BalanceKind::Other,
        "Something new",
        -100,
        -100,
    ));
    let err = payout_item_rows(&w.input(), date(1), date(30)).unwrap_err();
    assert!(err.as_validation().unwrap().message.contains("txn_9"));
}
