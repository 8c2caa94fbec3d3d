use crate::models::{DocumentHeader, LineItem};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A document as the backend stores it.
///
/// `subtotal`, `iva` and `total` are whatever the last writer computed; they
/// are informational on read and only trusted once re-derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "H: DocumentHeader")]
pub struct StoredDocument<H> {
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(flatten)]
    pub header: H,
    #[serde(default)]
    pub items: Vec<LineItem>,
    #[serde(default, serialize_with = "rust_decimal::serde::float::serialize")]
    pub subtotal: Decimal,
    #[serde(default, serialize_with = "rust_decimal::serde::float::serialize")]
    pub iva: Decimal,
    #[serde(default, serialize_with = "rust_decimal::serde::float::serialize")]
    pub total: Decimal,
}

/// Acknowledgement of a successful save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveConfirmation {
    pub id: String,
}
