//! Quotation and invoice documents.

use crate::dtos::StoredDocument;
use crate::models::{Customer, LineItem, LineItemCandidate, LineItemId, TaxRate};
use crate::services::id_source::IdSource;
use crate::services::totals::{self, LineItemError, Totals};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use std::fmt::Debug;
use validator::Validate;

/// Document family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Quotation,
    Invoice,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Quotation => "quotation",
            DocumentKind::Invoice => "invoice",
        }
    }

    pub fn from_string(s: &str) -> Option<Self> {
        match s {
            "quotation" | "cotizacion" => Some(DocumentKind::Quotation),
            "invoice" | "factura" => Some(DocumentKind::Invoice),
            _ => None,
        }
    }

    /// REST collection path, relative to the API base URL.
    pub fn resource_path(&self) -> &'static str {
        match self {
            DocumentKind::Quotation => "/cotizaciones",
            DocumentKind::Invoice => "/facturas",
        }
    }

    /// Envelope key the backend uses for a single document.
    pub fn singular_key(&self) -> &'static str {
        match self {
            DocumentKind::Quotation => "cotizacion",
            DocumentKind::Invoice => "factura",
        }
    }

    /// Envelope key the backend uses for a document listing.
    pub fn collection_key(&self) -> &'static str {
        match self {
            DocumentKind::Quotation => "cotizaciones",
            DocumentKind::Invoice => "facturas",
        }
    }
}

/// Quotation status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QuotationStatus {
    #[default]
    Pendiente,
    Aprobada,
    Rechazada,
}

/// Invoice status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InvoiceStatus {
    #[default]
    Pendiente,
    Pagada,
    Vencida,
    Cancelada,
}

/// Per-family header fields. Ties a header type to its [`DocumentKind`].
pub trait DocumentHeader:
    Serialize + DeserializeOwned + Validate + Clone + Debug + Send + Sync + 'static
{
    const KIND: DocumentKind;
}

/// Header of a quotation (cotización).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct QuotationHeader {
    #[serde(default)]
    pub numero: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fecha: Option<NaiveDate>,
    #[serde(default)]
    pub estado: QuotationStatus,
    #[serde(flatten)]
    #[validate(nested)]
    pub customer: Customer,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notas: Option<String>,
}

impl DocumentHeader for QuotationHeader {
    const KIND: DocumentKind = DocumentKind::Quotation;
}

/// Header of an invoice (factura).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceHeader {
    #[serde(default)]
    pub serie: String,
    #[serde(default)]
    pub folio: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fecha: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fecha_vencimiento: Option<NaiveDate>,
    #[serde(default)]
    pub estado: InvoiceStatus,
    #[serde(flatten)]
    #[validate(nested)]
    pub customer: Customer,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metodo_pago: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forma_pago: Option<String>,
    #[serde(rename = "usoCFDI", default, skip_serializing_if = "Option::is_none")]
    pub uso_cfdi: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notas: Option<String>,
}

impl DocumentHeader for InvoiceHeader {
    const KIND: DocumentKind = DocumentKind::Invoice;
}

/// A quotation or invoice with its line items and derived totals.
///
/// Items and totals are only reachable through methods that recompute the
/// totals from scratch, so the two can never disagree.
#[derive(Debug, Clone, PartialEq)]
pub struct Document<H> {
    id: Option<String>,
    header: H,
    tax_rate: TaxRate,
    items: Vec<LineItem>,
    totals: Totals,
}

pub type Quotation = Document<QuotationHeader>;
pub type Invoice = Document<InvoiceHeader>;

impl<H: DocumentHeader> Document<H> {
    /// A new, unsaved document with no items.
    pub fn new(header: H, tax_rate: TaxRate) -> Self {
        Self {
            id: None,
            header,
            tax_rate,
            items: Vec::new(),
            totals: Totals::default(),
        }
    }

    /// Build from a persisted record. Stored totals are discarded and
    /// re-derived from the items; a record whose totals are out of range is
    /// refused.
    pub fn from_stored(stored: StoredDocument<H>, tax_rate: TaxRate) -> Result<Self, AppError> {
        let totals = totals::recompute_totals(&stored.items, tax_rate).map_err(|e| {
            AppError::BadRequest(anyhow::anyhow!(
                "Stored {} {} cannot be totaled: {}",
                H::KIND.as_str(),
                stored.id.as_deref().unwrap_or("(unsaved)"),
                e
            ))
        })?;

        Ok(Self {
            id: stored.id,
            header: stored.header,
            tax_rate,
            items: stored.items,
            totals,
        })
    }

    /// Persistable record carrying the engine-produced totals.
    pub fn to_stored(&self) -> StoredDocument<H> {
        StoredDocument {
            id: self.id.clone(),
            header: self.header.clone(),
            items: self.items.clone(),
            subtotal: self.totals.subtotal,
            iva: self.totals.tax_amount,
            total: self.totals.total,
        }
    }

    pub fn kind(&self) -> DocumentKind {
        H::KIND
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub(crate) fn set_id(&mut self, id: String) {
        self.id = Some(id);
    }

    pub fn header(&self) -> &H {
        &self.header
    }

    pub fn header_mut(&mut self) -> &mut H {
        &mut self.header
    }

    pub fn tax_rate(&self) -> TaxRate {
        self.tax_rate
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn totals(&self) -> Totals {
        self.totals
    }

    pub fn item(&self, id: LineItemId) -> Option<&LineItem> {
        self.items.iter().find(|item| item.id() == id)
    }

    /// Validate `candidate`, append it with a fresh id and recompute.
    ///
    /// On error nothing changes.
    pub fn add_item<S: IdSource + ?Sized>(
        &mut self,
        candidate: LineItemCandidate,
        ids: &mut S,
    ) -> Result<LineItemId, LineItemError> {
        let (id, recomputed) = totals::add_item(&self.items, candidate, self.tax_rate, ids)?;
        self.items = recomputed.items;
        self.totals = recomputed.totals;

        tracing::debug!(
            kind = H::KIND.as_str(),
            items = self.items.len(),
            subtotal = %self.totals.subtotal,
            total = %self.totals.total,
            "Line item added"
        );

        Ok(id)
    }

    /// Remove the first item with `id`. Returns whether an item was removed;
    /// an unknown id leaves the document as it was, and so does an error.
    pub fn remove_item(&mut self, id: LineItemId) -> Result<bool, LineItemError> {
        let before = self.items.len();
        let recomputed = totals::remove_item(&self.items, id, self.tax_rate)?;
        self.items = recomputed.items;
        self.totals = recomputed.totals;

        let removed = self.items.len() < before;
        tracing::debug!(
            kind = H::KIND.as_str(),
            item_id = %id,
            removed,
            total = %self.totals.total,
            "Line item removal"
        );
        Ok(removed)
    }

    /// Change the applicable rate and recompute. On error the old rate stays.
    pub fn set_tax_rate(&mut self, tax_rate: TaxRate) -> Result<(), LineItemError> {
        self.totals = totals::recompute_totals(&self.items, tax_rate)?;
        self.tax_rate = tax_rate;
        Ok(())
    }

    /// Checks run before handing the document to the persistence layer.
    pub fn validate_for_save(&self) -> Result<(), AppError> {
        if self.items.is_empty() {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "A {} must contain at least one line item",
                H::KIND.as_str()
            )));
        }
        self.header.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::id_source::SequentialIds;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn rate() -> TaxRate {
        TaxRate::new(dec!(0.16)).unwrap()
    }

    fn header() -> QuotationHeader {
        QuotationHeader {
            numero: "COT-001".to_string(),
            customer: Customer {
                name: "Comercial del Norte".to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn kind_paths() {
        assert_eq!(DocumentKind::Quotation.resource_path(), "/cotizaciones");
        assert_eq!(DocumentKind::Invoice.resource_path(), "/facturas");
        assert_eq!(
            DocumentKind::from_string("factura"),
            Some(DocumentKind::Invoice)
        );
        assert_eq!(DocumentKind::from_string("receipt"), None);
    }

    #[test]
    fn new_document_has_zero_totals() {
        let doc = Quotation::new(header(), rate());
        assert!(doc.items().is_empty());
        assert_eq!(doc.totals(), Totals::default());
        assert_eq!(doc.kind(), DocumentKind::Quotation);
    }

    #[test]
    fn add_and_remove_keep_totals_current() {
        let mut doc = Quotation::new(header(), rate());
        let mut ids = SequentialIds::default();

        let widget = doc
            .add_item(LineItemCandidate::new("Widget", dec!(2), dec!(10)), &mut ids)
            .unwrap();
        doc.add_item(LineItemCandidate::new("Gadget", dec!(1), dec!(5)), &mut ids)
            .unwrap();
        assert_eq!(doc.totals().total, dec!(29));

        assert_eq!(doc.remove_item(widget), Ok(true));
        assert_eq!(doc.items().len(), 1);
        assert_eq!(doc.totals().subtotal, dec!(5));
        assert_eq!(doc.totals().tax_amount, dec!(0.8));
        assert_eq!(doc.remove_item(widget), Ok(false));
    }

    #[test]
    fn changing_rate_recomputes() {
        let mut doc = Quotation::new(header(), rate());
        let mut ids = SequentialIds::default();
        doc.add_item(LineItemCandidate::new("Widget", dec!(2), dec!(10)), &mut ids)
            .unwrap();

        doc.set_tax_rate(TaxRate::new(dec!(0.07)).unwrap()).unwrap();
        assert_eq!(doc.totals().tax_amount, dec!(1.4));
        assert_eq!(doc.totals().total, dec!(21.4));
    }

    #[test]
    fn empty_document_cannot_be_saved() {
        let doc = Quotation::new(header(), rate());
        assert!(matches!(
            doc.validate_for_save(),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn invalid_header_cannot_be_saved() {
        let mut doc = Quotation::new(QuotationHeader::default(), rate());
        let mut ids = SequentialIds::default();
        doc.add_item(LineItemCandidate::new("Widget", dec!(1), dec!(1)), &mut ids)
            .unwrap();
        assert!(matches!(
            doc.validate_for_save(),
            Err(AppError::ValidationError(_))
        ));
    }

    #[test]
    fn stored_totals_are_recomputed_on_load() {
        let mut source = Quotation::new(header(), rate());
        let mut ids = SequentialIds::default();
        source
            .add_item(LineItemCandidate::new("Widget", dec!(2), dec!(10)), &mut ids)
            .unwrap();

        let mut stored = source.to_stored();
        stored.subtotal = dec!(1);
        stored.iva = dec!(1);
        stored.total = dec!(1);

        let loaded = Quotation::from_stored(stored, rate()).unwrap();
        assert_eq!(loaded.totals(), source.totals());
    }

    #[test]
    fn stored_items_summing_out_of_range_are_refused() {
        let half = Decimal::MAX / dec!(2);
        let zero = TaxRate::new(Decimal::ZERO).unwrap();
        let mut source = Quotation::new(header(), zero);
        let mut ids = SequentialIds::default();
        source
            .add_item(LineItemCandidate::new("A", half, dec!(1)), &mut ids)
            .unwrap();

        let mut stored = source.to_stored();
        stored.id = Some("q-big".to_string());
        let extra = stored.items[0].clone();
        stored.items.extend([extra.clone(), extra]);

        match Quotation::from_stored(stored, rate()) {
            Err(AppError::BadRequest(e)) => assert!(e.to_string().contains("q-big")),
            other => panic!("expected BadRequest, got {:?}", other),
        }
    }

    #[test]
    fn rate_change_that_overflows_keeps_old_rate() {
        let zero = TaxRate::new(Decimal::ZERO).unwrap();
        let mut doc = Quotation::new(header(), zero);
        let mut ids = SequentialIds::default();
        doc.add_item(
            LineItemCandidate::new("A", Decimal::MAX / dec!(1.5), dec!(1)),
            &mut ids,
        )
        .unwrap();
        let before = doc.totals();

        let err = doc.set_tax_rate(TaxRate::new(Decimal::ONE).unwrap());
        assert_eq!(err, Err(LineItemError::AmountOverflow));
        assert_eq!(doc.tax_rate(), zero);
        assert_eq!(doc.totals(), before);
    }
}
