//! Totals engine integration tests for sales-documents.

mod common;

use common::{candidate, iva, rate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sales_documents::models::{LineItem, LineItemId};
use sales_documents::services::{
    add_item, compute_item_subtotal, recompute_totals, remove_item, LineItemError, SequentialIds,
    Totals,
};
use serde_json::json;

fn totals(items: &[LineItem], tax_rate: sales_documents::models::TaxRate) -> Totals {
    recompute_totals(items, tax_rate).expect("totals in range")
}

/// Build a list through the engine from (description, quantity, price) rows.
fn build(rows: &[(&str, Decimal, Decimal)]) -> (Vec<LineItem>, Vec<LineItemId>) {
    let mut ids = SequentialIds::default();
    let mut items = Vec::new();
    let mut assigned = Vec::new();
    for (description, quantity, unit_price) in rows {
        let (id, next) = add_item(
            &items,
            candidate(description, *quantity, *unit_price),
            iva(),
            &mut ids,
        )
        .expect("valid candidate");
        items = next.items;
        assigned.push(id);
    }
    (items, assigned)
}

#[test]
fn subtotal_is_exact_sum_of_item_subtotals() {
    let rows = [
        ("Consulting", dec!(10), dec!(150.00)),
        ("Travel", dec!(1), dec!(2345.67)),
        ("Paper", dec!(3.5), dec!(0.99)),
        ("Ink", dec!(12), dec!(18.25)),
    ];
    let (items, _) = build(&rows);

    let expected: Decimal = rows.iter().map(|(_, q, p)| q * p).sum();
    let computed = totals(&items, iva());

    assert_eq!(computed.subtotal, expected);
    assert_eq!(computed.subtotal, dec!(4068.135));
}

#[test]
fn tax_and_total_follow_the_configured_rate() {
    let (items, _) = build(&[("Widget", dec!(2), dec!(10)), ("Gadget", dec!(1), dec!(5))]);

    for r in [dec!(0), dec!(0.07), dec!(0.16), dec!(1)] {
        let computed = totals(&items, rate(r));
        assert_eq!(computed.tax_amount, computed.subtotal * r);
        assert_eq!(computed.total, computed.subtotal + computed.tax_amount);
    }

    let itbms = totals(&items, rate(dec!(0.07)));
    assert_eq!(itbms.tax_amount, dec!(1.75));
    assert_eq!(itbms.total, dec!(26.75));
}

#[test]
fn recompute_is_idempotent() {
    let (items, _) = build(&[("Widget", dec!(2), dec!(10)), ("Gadget", dec!(3), dec!(0.1))]);
    let snapshot = items.clone();

    let first = totals(&items, iva());
    let second = totals(&items, iva());

    assert_eq!(first, second);
    assert_eq!(items, snapshot);
}

#[test]
fn add_then_remove_restores_previous_state() {
    let (items, _) = build(&[("Widget", dec!(2), dec!(10))]);
    let before = totals(&items, iva());
    let mut ids = SequentialIds::after(&items);

    for (description, quantity, unit_price) in [
        ("Gadget", dec!(1), dec!(5)),
        ("Bolt", dec!(100), dec!(0.05)),
        ("Service", dec!(0.5), dec!(800)),
    ] {
        let (id, added) = add_item(
            &items,
            candidate(description, quantity, unit_price),
            iva(),
            &mut ids,
        )
        .unwrap();
        let removed = remove_item(&added.items, id, iva()).unwrap();

        assert_eq!(removed.items, items);
        assert_eq!(removed.totals, before);
    }
}

#[test]
fn invalid_candidates_are_rejected_independently() {
    let (items, _) = build(&[("Widget", dec!(2), dec!(10))]);
    let before = totals(&items, iva());
    let mut ids = SequentialIds::after(&items);

    let cases = [
        (candidate("", dec!(1), dec!(5)), LineItemError::EmptyDescription),
        (
            candidate("Gadget", dec!(0), dec!(5)),
            LineItemError::NonPositiveQuantity(dec!(0)),
        ),
        (
            candidate("Gadget", dec!(1), dec!(0)),
            LineItemError::NonPositiveUnitPrice(dec!(0)),
        ),
        (
            candidate("Gadget", dec!(1), dec!(-5)),
            LineItemError::NonPositiveUnitPrice(dec!(-5)),
        ),
    ];

    for (bad, expected) in cases {
        let err = add_item(&items, bad, iva(), &mut ids).unwrap_err();
        assert_eq!(err, expected);
        assert_eq!(totals(&items, iva()), before);
        assert_eq!(items.len(), 1);
    }
}

#[test]
fn removing_unknown_id_changes_nothing() {
    let (items, _) = build(&[("Widget", dec!(2), dec!(10)), ("Gadget", dec!(1), dec!(5))]);
    let before = totals(&items, iva());

    let after = remove_item(&items, LineItemId::new(424242), iva()).unwrap();
    assert_eq!(after.items, items);
    assert_eq!(after.totals, before);
}

#[test]
fn widget_gadget_scenario() {
    let mut ids = SequentialIds::default();

    let (widget, one) = add_item(&[], candidate("Widget", dec!(2), dec!(10)), iva(), &mut ids)
        .unwrap();
    assert_eq!(one.items.len(), 1);
    assert_eq!(one.items[0].subtotal(), dec!(20));
    assert_eq!(one.totals.subtotal, dec!(20));
    assert_eq!(one.totals.tax_amount, dec!(3.2));
    assert_eq!(one.totals.total, dec!(23.2));

    let (_, two) = add_item(
        &one.items,
        candidate("Gadget", dec!(1), dec!(5)),
        iva(),
        &mut ids,
    )
    .unwrap();
    assert_eq!(two.totals.subtotal, dec!(25));
    assert_eq!(two.totals.tax_amount, dec!(4));
    assert_eq!(two.totals.total, dec!(29));

    let three = remove_item(&two.items, widget, iva()).unwrap();
    assert_eq!(three.items.len(), 1);
    assert_eq!(three.items[0].description(), "Gadget");
    assert_eq!(three.totals.subtotal, dec!(5));
    assert_eq!(three.totals.tax_amount, dec!(0.8));
    assert_eq!(three.totals.total, dec!(5.8));
}

#[test]
fn item_subtotal_is_plain_product() {
    assert_eq!(compute_item_subtotal(dec!(2), dec!(10)), Ok(dec!(20)));
    assert_eq!(compute_item_subtotal(dec!(0.333), dec!(3)), Ok(dec!(0.999)));
}

#[test]
fn remove_drops_only_first_of_duplicate_ids() {
    // clock-based ids written by older clients can repeat
    let items: Vec<LineItem> = serde_json::from_value(json!([
        {"id": 1700000000001u64, "descripcion": "Widget", "cantidad": 2, "precio": 10},
        {"id": 1700000000002u64, "descripcion": "Gadget", "cantidad": 1, "precio": 5},
        {"id": 1700000000001u64, "descripcion": "Bolt", "cantidad": 4, "precio": 0.25}
    ]))
    .unwrap();

    let after = remove_item(&items, LineItemId::new(1_700_000_000_001), iva()).unwrap();

    let names: Vec<&str> = after.items.iter().map(LineItem::description).collect();
    assert_eq!(names, ["Gadget", "Bolt"]);
    assert_eq!(after.items[1].id(), LineItemId::new(1_700_000_000_001));
    assert_eq!(after.totals.subtotal, dec!(6));
    assert_eq!(after.totals.tax_amount, dec!(0.96));
    assert_eq!(after.totals.total, dec!(6.96));

    let again = remove_item(&after.items, LineItemId::new(1_700_000_000_001), iva())
        .expect("remove second duplicate");
    assert_eq!(again.items.len(), 1);
    assert_eq!(again.totals.subtotal, dec!(5));
}

#[test]
fn whitespace_description_counts_as_present() {
    let mut ids = SequentialIds::default();
    let (_, added) = add_item(&[], candidate(" ", dec!(1), dec!(5)), iva(), &mut ids).unwrap();
    assert_eq!(added.items.len(), 1);
    assert_eq!(added.totals.total, dec!(5.8));
}

#[test]
fn amounts_past_decimal_range_are_rejected_not_fatal() {
    let (items, _) = build(&[("Widget", dec!(2), dec!(10))]);
    let before = totals(&items, iva());
    let mut ids = SequentialIds::after(&items);
    let huge = Decimal::from(100_000_000_000_000_000u64);

    let err = add_item(&items, candidate("Bulk", huge, huge), iva(), &mut ids).unwrap_err();
    assert_eq!(err, LineItemError::AmountOverflow);
    assert_eq!(totals(&items, iva()), before);
}
