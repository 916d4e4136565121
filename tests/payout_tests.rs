#![cfg(feature = "payout")]

use avoir::core::*;
use avoir::payout::*;
use chrono::NaiveDate;
use rust_decimal_macros::dec;

fn date(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 4, d).unwrap()
}

fn invoice(number: &str, charge: &str) -> Invoice {
    InvoiceBuilder::new(number, date(1))
        .settlement_ref(charge)
        .add_line("Pro plan", 1, 10_000)
        .build()
        .unwrap()
}

fn item(
    id: &str,
    kind: BalanceKind,
    description: &str,
    gross: i64,
    net: i64,
    day: u32,
) -> PayoutItem {
    PayoutItem {
        id: id.into(),
        kind,
        description: description.into(),
        gross,
        net,
        created: date(day),
        source: None,
    }
}

#[test]
fn invoice_in_two_payouts_names_both() {
    let invoices = vec![invoice("25004-0001", "ch_1"), invoice("25004-0002", "ch_2")];
    let payouts = vec![
        Payout::new("po_a", date(3), "EUR").settles("ch_1").settles("ch_2"),
        Payout::new("po_b", date(10), "EUR").settles("ch_2"),
    ];
    let err = link_payouts(&invoices, &payouts).unwrap_err();
    match err.as_consistency() {
        Some(ConsistencyError::DuplicateSettlement {
            invoice,
            first_payout,
            second_payout,
        }) => {
            assert_eq!(invoice, "25004-0002");
            assert_eq!(first_payout, "po_a");
            assert_eq!(second_payout, "po_b");
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(err.to_string().contains("po_a"));
    assert!(err.to_string().contains("po_b"));
}

#[test]
fn unsettled_invoices_are_not_errors() {
    let invoices = vec![invoice("25004-0002", "ch_2"), invoice("25004-0001", "ch_1")];
    let payouts = vec![Payout::new("po_a", date(3), "EUR")];
    let links = link_payouts(&invoices, &payouts).unwrap();
    assert!(links.payouts[0].invoices.is_empty());
    let unsettled: Vec<String> = links.unsettled.iter().map(|i| i.number.to_string()).collect();
    assert_eq!(unsettled, ["25004-0001", "25004-0002"]);
    assert!(links.payout_for(&invoices[0].number).is_none());
}

#[test]
fn payout_order_is_kept() {
    let invoices = vec![
        invoice("25004-0001", "ch_1"),
        invoice("25004-0002", "ch_2"),
        invoice("25004-0003", "ch_3"),
    ];
    let payouts = vec![
        Payout::new("po_a", date(3), "EUR").settles("ch_3").settles("ch_1"),
        Payout::new("po_b", date(10), "EUR").settles("ch_2").settles("ch_unknown"),
    ];
    let links = link_payouts(&invoices, &payouts).unwrap();
    let a: Vec<String> = links.payouts[0].invoices.iter().map(|i| i.number.to_string()).collect();
    assert_eq!(a, ["25004-0003", "25004-0001"]);
    assert_eq!(links.payout_for(&invoices[1].number).unwrap().arrival_date, date(10));
    assert_eq!(links.unknown_refs.len(), 1);
    assert_eq!(links.unknown_refs[0].reference, "ch_unknown");
    assert!(links.unsettled.is_empty());
}

#[test]
fn every_known_description_has_a_category() {
    let payout = Payout::new("po_a", date(3), "EUR");
    let cases = [
        (BalanceKind::StripeFee, "Billing - Usage Fee (2025-03-01)", FeeCategory::Billing),
        (BalanceKind::StripeFee, "Automatic Taxes (2025-03-01)", FeeCategory::TaxProduct),
        (BalanceKind::Charge, "Subscription creation", FeeCategory::ProcessingCard),
        (BalanceKind::Payment, "Subscription update", FeeCategory::ProcessingOther),
        (BalanceKind::StripeFee, "Radar for Fraud Teams", FeeCategory::Radar),
        (BalanceKind::Adjustment, "REFUND FOR CHARGE (Chargeback)", FeeCategory::Disputes),
        (BalanceKind::Refund, "REFUND FOR PAYMENT", FeeCategory::BankAccount),
        (BalanceKind::Adjustment, "Chargeback withdrawal for ch_1", FeeCategory::DisputeFees),
    ];
    for (kind, description, expected) in cases {
        let i = item("txn_1", kind, description, -100, -100, 2);
        assert_eq!(categorize(&i, &payout).unwrap(), expected, "{description}");
    }
}

#[test]
fn fee_summary_uses_gross_or_fee() {
    let payout = Payout::new("po_a", date(3), "EUR")
        .amounts(23_000, 700)
        .item(item("txn_1", BalanceKind::Charge, "Subscription creation", 12_100, 11_750, 1))
        .item(item("txn_2", BalanceKind::Charge, "Subscription update", 12_100, 11_750, 2))
        .item(item("txn_3", BalanceKind::StripeFee, "Billing - Usage Fee", -500, -500, 2))
        .item(item("txn_4", BalanceKind::Payout, "STRIPE PAYOUT", -23_000, -23_000, 3));
    let summary = fee_summary([&payout], &CurrencyTable::default()).unwrap();
    assert_eq!(
        summary.get("EUR", FeeCategory::ProcessingCard).unwrap().amount,
        dec!(7.00)
    );
    assert_eq!(summary.get("EUR", FeeCategory::Billing).unwrap().amount, dec!(5.00));
    assert_eq!(payout.items_between(date(2), date(2)).count(), 2);
}

#[test]
fn uncategorised_item_fails_summary() {
    let payout = Payout::new("po_a", date(3), "EUR")
        .item(item("txn_9", BalanceKind::Other, "Something new", -100, -100, 1));
    let err = fee_summary([&payout], &CurrencyTable::default()).unwrap_err();
    let v = err.as_validation().unwrap();
    assert!(v.message.contains("txn_9"));
    assert!(v.message.contains("po_a"));
}

#[test]
fn payout_deserializes_from_platform_json() {
    let json = r#"{
        "id": "po_1",
        "arrival_date": "2025-04-03",
        "currency": "EUR",
        "amount": 23000,
        "settles": ["ch_1"],
        "items": [
            {
                "id": "txn_1", "kind": "stripe_fee", "description": "Radar",
                "gross": -5, "net": -5, "created": "2025-04-02"
            },
            {
                "id": "txn_2", "kind": "contribution", "description": "Climate",
                "gross": -10, "net": -10, "created": "2025-04-02"
            }
        ]
    }"#;
    let payout: Payout = serde_json::from_str(json).unwrap();
    assert_eq!(payout.items[0].kind, BalanceKind::StripeFee);
    assert_eq!(payout.items[1].kind, BalanceKind::Other);
    assert_eq!(payout.fee, 0);
}
