//! Persistence collaborator contract.

use crate::dtos::{SaveConfirmation, StoredDocument};
use crate::models::{DocumentHeader, DocumentKind};
use async_trait::async_trait;
use dashmap::DashMap;
use service_core::error::AppError;
use uuid::Uuid;

/// Where documents are loaded from and saved to.
///
/// The engine never performs I/O itself; everything that can fail for
/// reasons other than invalid input goes through this trait.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn load<H: DocumentHeader>(&self, id: &str) -> Result<StoredDocument<H>, AppError>;

    /// Create the document when it has no id yet, otherwise replace it.
    async fn save<H: DocumentHeader>(
        &self,
        document: &StoredDocument<H>,
    ) -> Result<SaveConfirmation, AppError>;
}

/// Process-local store keyed by kind and id.
#[derive(Default)]
pub struct InMemoryDocumentStore {
    documents: DashMap<(DocumentKind, String), serde_json::Value>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Raw stored JSON, as a backend would hold it.
    pub fn raw(&self, kind: DocumentKind, id: &str) -> Option<serde_json::Value> {
        self.documents
            .get(&(kind, id.to_string()))
            .map(|entry| entry.value().clone())
    }

    /// Seed a record verbatim, e.g. one written by another client.
    pub fn insert_raw(&self, kind: DocumentKind, id: &str, value: serde_json::Value) {
        self.documents.insert((kind, id.to_string()), value);
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn load<H: DocumentHeader>(&self, id: &str) -> Result<StoredDocument<H>, AppError> {
        let value = self.raw(H::KIND, id).ok_or_else(|| {
            AppError::NotFound(anyhow::anyhow!("{} {} not found", H::KIND.as_str(), id))
        })?;

        let mut document: StoredDocument<H> = serde_json::from_value(value)?;
        document.id = Some(id.to_string());
        Ok(document)
    }

    async fn save<H: DocumentHeader>(
        &self,
        document: &StoredDocument<H>,
    ) -> Result<SaveConfirmation, AppError> {
        let id = match &document.id {
            Some(id) => {
                if !self.documents.contains_key(&(H::KIND, id.clone())) {
                    return Err(AppError::NotFound(anyhow::anyhow!(
                        "{} {} not found",
                        H::KIND.as_str(),
                        id
                    )));
                }
                id.clone()
            }
            None => Uuid::new_v4().to_string(),
        };

        let mut record = document.clone();
        record.id = Some(id.clone());
        let value = serde_json::to_value(&record)
            .map_err(|e| AppError::InternalError(anyhow::anyhow!("Serialize failed: {}", e)))?;
        self.documents.insert((H::KIND, id.clone()), value);

        tracing::debug!(kind = H::KIND.as_str(), id = %id, "[IN-MEMORY] Document saved");
        Ok(SaveConfirmation { id })
    }
}
