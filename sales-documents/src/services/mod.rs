//! Services module for sales-documents.

pub mod api_client;
pub mod editor;
pub mod id_source;
pub mod metrics;
pub mod store;
pub mod totals;

pub use api_client::ApiClient;
pub use editor::{DocumentEditor, NewItemDraft};
pub use id_source::{IdSource, SequentialIds};
pub use metrics::{get_metrics, init_metrics};
pub use store::{DocumentStore, InMemoryDocumentStore};
pub use totals::{
    add_item, compute_item_subtotal, recompute_totals, remove_item, LineItemError, Recomputed,
    Totals,
};
