//! Editing session over one document.
//!
//! Owns the document, the id source and the "new item" input buffer. A
//! caller drives it one action at a time; nothing here is shared.

use crate::dtos::{SaveConfirmation, StoredDocument};
use crate::models::{Document, DocumentHeader, LineItemCandidate, LineItemId, TaxRate};
use crate::services::id_source::{IdSource, SequentialIds};
use crate::services::metrics::{LINE_ITEM_OPERATIONS_TOTAL, VALIDATION_FAILURES_TOTAL};
use crate::services::store::DocumentStore;
use crate::services::totals::{self, LineItemError};
use rust_decimal::Decimal;
use service_core::error::AppError;
use tracing::instrument;

/// The pending line item being typed in before it is added.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItemDraft {
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
}

impl Default for NewItemDraft {
    fn default() -> Self {
        Self {
            description: String::new(),
            quantity: Decimal::ONE,
            unit_price: Decimal::ZERO,
        }
    }
}

impl NewItemDraft {
    pub fn subtotal(&self) -> Result<Decimal, LineItemError> {
        totals::compute_item_subtotal(self.quantity, self.unit_price)
    }

    fn to_candidate(&self) -> LineItemCandidate {
        LineItemCandidate::new(self.description.clone(), self.quantity, self.unit_price)
    }
}

pub struct DocumentEditor<H, S = SequentialIds> {
    document: Document<H>,
    ids: S,
    draft: NewItemDraft,
}

impl<H: DocumentHeader> DocumentEditor<H, SequentialIds> {
    /// Start a new, empty document.
    pub fn new(header: H, tax_rate: TaxRate) -> Self {
        Self::from_document(Document::new(header, tax_rate))
    }

    /// Edit an existing document; new ids continue past the loaded ones.
    pub fn from_document(document: Document<H>) -> Self {
        let ids = SequentialIds::after(document.items());
        Self::with_id_source(document, ids)
    }

    /// Edit a persisted record; its totals are recomputed with `tax_rate`.
    pub fn from_stored(stored: StoredDocument<H>, tax_rate: TaxRate) -> Result<Self, AppError> {
        let document = Document::from_stored(stored, tax_rate)?;

        tracing::info!(
            kind = H::KIND.as_str(),
            id = document.id(),
            items = document.items().len(),
            total = %document.totals().total,
            "Document loaded"
        );
        Ok(Self::from_document(document))
    }

    /// Load a document and recompute its totals with `tax_rate`.
    #[instrument(skip(store), fields(kind = H::KIND.as_str()))]
    pub async fn open<St>(store: &St, id: &str, tax_rate: TaxRate) -> Result<Self, AppError>
    where
        St: DocumentStore,
    {
        let stored = store.load::<H>(id).await?;
        Self::from_stored(stored, tax_rate)
    }
}

impl<H: DocumentHeader, S: IdSource> DocumentEditor<H, S> {
    pub fn with_id_source(document: Document<H>, ids: S) -> Self {
        Self {
            document,
            ids,
            draft: NewItemDraft::default(),
        }
    }

    pub fn document(&self) -> &Document<H> {
        &self.document
    }

    pub fn header_mut(&mut self) -> &mut H {
        self.document.header_mut()
    }

    pub fn into_document(self) -> Document<H> {
        self.document
    }

    pub fn draft(&self) -> &NewItemDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut NewItemDraft {
        &mut self.draft
    }

    /// Live subtotal of the item being typed in.
    pub fn draft_subtotal(&self) -> Result<Decimal, LineItemError> {
        self.draft.subtotal()
    }

    /// Add the draft as a line item. The draft is reset on success and kept
    /// as typed on failure so the user can correct it.
    pub fn add_draft_item(&mut self) -> Result<LineItemId, LineItemError> {
        let candidate = self.draft.to_candidate();
        let id = self.add_item(candidate)?;
        self.draft = NewItemDraft::default();
        Ok(id)
    }

    /// Add a fully specified item without going through the draft.
    pub fn add_item(&mut self, candidate: LineItemCandidate) -> Result<LineItemId, LineItemError> {
        let kind = H::KIND.as_str();
        match self.document.add_item(candidate, &mut self.ids) {
            Ok(id) => {
                LINE_ITEM_OPERATIONS_TOTAL
                    .with_label_values(&[kind, "add", "accepted"])
                    .inc();
                Ok(id)
            }
            Err(e) => {
                LINE_ITEM_OPERATIONS_TOTAL
                    .with_label_values(&[kind, "add", "rejected"])
                    .inc();
                VALIDATION_FAILURES_TOTAL
                    .with_label_values(&[e.reason()])
                    .inc();
                tracing::warn!(kind, reason = e.reason(), "Line item rejected");
                Err(e)
            }
        }
    }

    pub fn remove_item(&mut self, id: LineItemId) -> Result<bool, LineItemError> {
        let kind = H::KIND.as_str();
        let result = self.document.remove_item(id);
        let outcome = match &result {
            Ok(true) => "accepted",
            Ok(false) => "noop",
            Err(e) => {
                VALIDATION_FAILURES_TOTAL
                    .with_label_values(&[e.reason()])
                    .inc();
                tracing::warn!(
                    kind,
                    item_id = %id,
                    reason = e.reason(),
                    "Line item removal rejected"
                );
                "rejected"
            }
        };
        LINE_ITEM_OPERATIONS_TOTAL
            .with_label_values(&[kind, "remove", outcome])
            .inc();
        result
    }

    /// Validate and persist. The backend-assigned id is kept so later saves
    /// update the same record.
    #[instrument(skip(self, store), fields(kind = H::KIND.as_str()))]
    pub async fn save<St>(&mut self, store: &St) -> Result<SaveConfirmation, AppError>
    where
        St: DocumentStore,
    {
        self.document.validate_for_save()?;

        let confirmation = store.save(&self.document.to_stored()).await?;
        if self.document.id() != Some(confirmation.id.as_str()) {
            self.document.set_id(confirmation.id.clone());
        }

        tracing::info!(
            id = %confirmation.id,
            items = self.document.items().len(),
            total = %self.document.totals().total,
            "Document saved"
        );
        Ok(confirmation)
    }
}
