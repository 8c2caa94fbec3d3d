//! Totals engine: line item subtotals, document subtotal, tax and grand total.
//!
//! Every function here is pure. Mutations take the current item list by
//! reference and return a new list with its totals, so a rejected operation
//! can never disturb the caller's state. Totals are always recomputed from
//! the full list rather than adjusted incrementally. All arithmetic is
//! checked: amounts outside the `Decimal` range are refused, never wrapped.

use crate::models::{LineItem, LineItemCandidate, LineItemId, TaxRate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use std::iter;
use thiserror::Error;

use super::id_source::IdSource;

/// Reasons a line item operation is refused.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LineItemError {
    #[error("Line item description is required")]
    EmptyDescription,

    #[error("Line item quantity must be greater than zero (got {0})")]
    NonPositiveQuantity(Decimal),

    #[error("Line item unit price must be greater than zero (got {0})")]
    NonPositiveUnitPrice(Decimal),

    #[error("Line item amounts exceed the supported range")]
    AmountOverflow,

    #[error("No line item ids are left for this document")]
    IdsExhausted,
}

impl LineItemError {
    /// Label for metrics and logs.
    pub fn reason(&self) -> &'static str {
        match self {
            LineItemError::EmptyDescription => "empty_description",
            LineItemError::NonPositiveQuantity(_) => "non_positive_quantity",
            LineItemError::NonPositiveUnitPrice(_) => "non_positive_unit_price",
            LineItemError::AmountOverflow => "amount_overflow",
            LineItemError::IdsExhausted => "ids_exhausted",
        }
    }
}

impl From<LineItemError> for AppError {
    fn from(err: LineItemError) -> Self {
        AppError::BadRequest(anyhow::Error::new(err))
    }
}

/// Derived document totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
}

/// An item list together with the totals computed from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recomputed {
    pub items: Vec<LineItem>,
    pub totals: Totals,
}

/// `quantity * unit_price`, unrounded.
pub fn compute_item_subtotal(
    quantity: Decimal,
    unit_price: Decimal,
) -> Result<Decimal, LineItemError> {
    quantity
        .checked_mul(unit_price)
        .ok_or(LineItemError::AmountOverflow)
}

pub fn recompute_totals(items: &[LineItem], tax_rate: TaxRate) -> Result<Totals, LineItemError> {
    totals_from(items.iter().map(LineItem::subtotal), tax_rate)
}

fn totals_from<I>(subtotals: I, tax_rate: TaxRate) -> Result<Totals, LineItemError>
where
    I: IntoIterator<Item = Decimal>,
{
    let subtotal = subtotals
        .into_iter()
        .try_fold(Decimal::ZERO, |sum, amount| sum.checked_add(amount))
        .ok_or(LineItemError::AmountOverflow)?;
    let tax_amount = tax_rate
        .apply(subtotal)
        .ok_or(LineItemError::AmountOverflow)?;
    let total = subtotal
        .checked_add(tax_amount)
        .ok_or(LineItemError::AmountOverflow)?;

    Ok(Totals {
        subtotal,
        tax_amount,
        total,
    })
}

/// Check a candidate's fields before it is accepted.
pub fn validate_candidate(candidate: &LineItemCandidate) -> Result<(), LineItemError> {
    if candidate.description.is_empty() {
        return Err(LineItemError::EmptyDescription);
    }
    if candidate.quantity <= Decimal::ZERO {
        return Err(LineItemError::NonPositiveQuantity(candidate.quantity));
    }
    if candidate.unit_price <= Decimal::ZERO {
        return Err(LineItemError::NonPositiveUnitPrice(candidate.unit_price));
    }
    Ok(())
}

/// Append `candidate` under a fresh id from `ids` and recompute.
///
/// Returns the assigned id. No id is consumed when the candidate is refused.
pub fn add_item<S: IdSource + ?Sized>(
    items: &[LineItem],
    candidate: LineItemCandidate,
    tax_rate: TaxRate,
    ids: &mut S,
) -> Result<(LineItemId, Recomputed), LineItemError> {
    validate_candidate(&candidate)?;

    let amount = compute_item_subtotal(candidate.quantity, candidate.unit_price)?;
    let totals = totals_from(
        items
            .iter()
            .map(LineItem::subtotal)
            .chain(iter::once(amount)),
        tax_rate,
    )?;

    let id = ids.next_id().ok_or(LineItemError::IdsExhausted)?;
    let mut updated = Vec::with_capacity(items.len() + 1);
    updated.extend_from_slice(items);
    updated.push(LineItem::new(id, candidate)?);

    Ok((
        id,
        Recomputed {
            items: updated,
            totals,
        },
    ))
}

/// Drop the first item whose id is `id` and recompute. Unknown ids are a
/// no-op.
///
/// Only fails when a loaded list mixes signed amounts whose remaining sum
/// is out of range.
pub fn remove_item(
    items: &[LineItem],
    id: LineItemId,
    tax_rate: TaxRate,
) -> Result<Recomputed, LineItemError> {
    let mut updated = items.to_vec();
    if let Some(pos) = updated.iter().position(|item| item.id() == id) {
        updated.remove(pos);
    }

    let totals = recompute_totals(&updated, tax_rate)?;
    Ok(Recomputed {
        items: updated,
        totals,
    })
}
