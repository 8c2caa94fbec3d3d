//! Prometheus metrics for sales-documents.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, HistogramVec, TextEncoder,
};

/// Line item operations by document kind, operation and outcome.
pub static LINE_ITEM_OPERATIONS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "sales_documents_line_item_operations_total",
        "Total number of line item operations",
        &["kind", "operation", "outcome"] // add/remove, accepted/rejected/noop
    )
    .expect("Failed to register line_item_operations_total")
});

/// Rejected line item candidates by reason.
pub static VALIDATION_FAILURES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "sales_documents_validation_failures_total",
        "Total number of rejected line item candidates by reason",
        &["reason"]
    )
    .expect("Failed to register validation_failures_total")
});

/// Backend request duration histogram by operation.
pub static BACKEND_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "sales_documents_backend_request_duration_seconds",
        "REST backend request duration in seconds",
        &["operation"],
        vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]
    )
    .expect("Failed to register backend_request_duration")
});

/// Backend errors by type.
pub static BACKEND_ERRORS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "sales_documents_backend_errors_total",
        "Total number of failed backend requests by error type",
        &["operation", "error_type"]
    )
    .expect("Failed to register backend_errors_total")
});

/// Initialize all metrics (forces lazy initialization).
pub fn init_metrics() {
    Lazy::force(&LINE_ITEM_OPERATIONS_TOTAL);
    Lazy::force(&VALIDATION_FAILURES_TOTAL);
    Lazy::force(&BACKEND_REQUEST_DURATION);
    Lazy::force(&BACKEND_ERRORS_TOTAL);
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder
        .encode_to_string(&metric_families)
        .unwrap_or_default()
}
