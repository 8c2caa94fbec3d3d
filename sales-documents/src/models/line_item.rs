//! Line item model for sales documents.

use crate::services::totals::{self, LineItemError};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a line item, unique within its document.
///
/// Only used to find an item again for removal; never for ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineItemId(u64);

impl LineItemId {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for LineItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A priced line on a quotation or invoice.
///
/// Fields are private: the subtotal is derived once from the quantity and
/// unit price and can never disagree with them. An item whose subtotal is
/// out of range cannot be built, including from stored data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "LineItemRecord", into = "LineItemRecord")]
pub struct LineItem {
    id: LineItemId,
    description: String,
    quantity: Decimal,
    unit_price: Decimal,
    subtotal: Decimal,
}

impl LineItem {
    pub(crate) fn new(
        id: LineItemId,
        candidate: LineItemCandidate,
    ) -> Result<Self, LineItemError> {
        let subtotal = totals::compute_item_subtotal(candidate.quantity, candidate.unit_price)?;
        Ok(Self {
            id,
            description: candidate.description,
            quantity: candidate.quantity,
            unit_price: candidate.unit_price,
            subtotal,
        })
    }

    pub fn id(&self) -> LineItemId {
        self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn quantity(&self) -> Decimal {
        self.quantity
    }

    pub fn unit_price(&self) -> Decimal {
        self.unit_price
    }

    pub fn subtotal(&self) -> Decimal {
        self.subtotal
    }
}

/// Input for adding a line item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItemCandidate {
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
}

impl LineItemCandidate {
    pub fn new(description: impl Into<String>, quantity: Decimal, unit_price: Decimal) -> Self {
        Self {
            description: description.into(),
            quantity,
            unit_price,
        }
    }
}

/// Wire shape used by the REST backend.
///
/// The stored `subtotal` is written for the backend's benefit and ignored on
/// read.
#[derive(Debug, Serialize, Deserialize)]
struct LineItemRecord {
    id: LineItemId,
    #[serde(rename = "descripcion")]
    description: String,
    #[serde(rename = "cantidad", serialize_with = "rust_decimal::serde::float::serialize")]
    quantity: Decimal,
    #[serde(rename = "precio", serialize_with = "rust_decimal::serde::float::serialize")]
    unit_price: Decimal,
    #[serde(default, serialize_with = "rust_decimal::serde::float::serialize")]
    subtotal: Decimal,
}

impl TryFrom<LineItemRecord> for LineItem {
    type Error = LineItemError;

    fn try_from(record: LineItemRecord) -> Result<Self, Self::Error> {
        Self::new(
            record.id,
            LineItemCandidate::new(record.description, record.quantity, record.unit_price),
        )
    }
}

impl From<LineItem> for LineItemRecord {
    fn from(item: LineItem) -> Self {
        Self {
            id: item.id,
            description: item.description,
            quantity: item.quantity,
            unit_price: item.unit_price,
            subtotal: item.subtotal,
        }
    }
}
