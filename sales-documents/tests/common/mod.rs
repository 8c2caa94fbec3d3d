//! Shared helpers for sales-documents integration tests.
#![allow(dead_code)]

use rust_decimal::Decimal;
use sales_documents::config::ApiSettings;
use sales_documents::models::{
    Customer, InvoiceHeader, LineItemCandidate, QuotationHeader, TaxRate,
};
use sales_documents::services::ApiClient;
use secrecy::Secret;
use serde_json::{json, Value};
use wiremock::MockServer;

pub const TEST_TOKEN: &str = "test-token";

/// A mock REST backend plus a client pointed at it.
pub struct TestBackend {
    pub server: MockServer,
    pub client: ApiClient,
}

impl TestBackend {
    pub async fn spawn() -> Self {
        let server = MockServer::start().await;
        let client = ApiClient::new(&ApiSettings {
            base_url: format!("{}/api", server.uri()),
            token: Some(Secret::new(TEST_TOKEN.to_string())),
            timeout_secs: 5,
        })
        .expect("Failed to build client");

        TestBackend { server, client }
    }
}

pub fn iva() -> TaxRate {
    TaxRate::IVA_GENERAL
}

pub fn rate(value: Decimal) -> TaxRate {
    TaxRate::new(value).expect("valid rate")
}

pub fn candidate(description: &str, quantity: Decimal, unit_price: Decimal) -> LineItemCandidate {
    LineItemCandidate::new(description, quantity, unit_price)
}

pub fn quotation_header() -> QuotationHeader {
    QuotationHeader {
        numero: "COT-2024-001".to_string(),
        customer: Customer {
            name: "Comercial del Norte".to_string(),
            rfc: Some("CNO010101AB1".to_string()),
            email: Some("compras@norte.mx".to_string()),
            ..Default::default()
        },
        ..Default::default()
    }
}

pub fn invoice_header() -> InvoiceHeader {
    InvoiceHeader {
        serie: "A".to_string(),
        folio: "1001".to_string(),
        customer: Customer {
            name: "Comercial del Norte".to_string(),
            ..Default::default()
        },
        metodo_pago: Some("PUE".to_string()),
        ..Default::default()
    }
}

/// A stored quotation as the backend returns it, with stale totals.
pub fn stored_quotation_json(id: &str) -> Value {
    json!({
        "_id": id,
        "numero": "COT-2024-001",
        "fecha": "2024-03-01",
        "cliente": "Comercial del Norte",
        "estado": "PENDIENTE",
        "items": [
            {"id": 1700000000001u64, "descripcion": "Widget", "cantidad": 2, "precio": 10, "subtotal": 20},
            {"id": 1700000000002u64, "descripcion": "Gadget", "cantidad": "1", "precio": "5", "subtotal": 5}
        ],
        "subtotal": 25,
        "iva": 1.75,
        "total": 26.75,
        "createdAt": "Fri, 01 Mar 2024 10:00:00 GMT"
    })
}
