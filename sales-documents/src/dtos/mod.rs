//! Wire records exchanged with the REST backend.

mod document;

pub use document::{SaveConfirmation, StoredDocument};
