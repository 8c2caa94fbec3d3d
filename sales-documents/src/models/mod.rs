//! Domain models for sales documents.

mod customer;
mod document;
mod line_item;
mod tax_rate;

pub use customer::{validate_phone, validate_rfc, Customer};
pub use document::{
    Document, DocumentHeader, DocumentKind, Invoice, InvoiceHeader, InvoiceStatus, Quotation,
    QuotationHeader, QuotationStatus,
};
pub use line_item::{LineItem, LineItemCandidate, LineItemId};
pub use tax_rate::{TaxRate, TaxRateError};
