//! Configuration module for sales-documents.

use crate::models::{DocumentKind, TaxRate};
use dotenvy::dotenv;
use secrecy::Secret;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

#[derive(Debug, Clone)]
pub struct SalesDocumentsConfig {
    pub common: core_config::Config,
    pub service_name: String,
    pub api: ApiSettings,
    pub tax: TaxSettings,
}

#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    pub token: Option<Secret<String>>,
    pub timeout_secs: u64,
}

/// Tax rate per document family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaxSettings {
    pub quotation: TaxRate,
    pub invoice: TaxRate,
}

impl TaxSettings {
    pub fn rate_for(&self, kind: DocumentKind) -> TaxRate {
        match kind {
            DocumentKind::Quotation => self.quotation,
            DocumentKind::Invoice => self.invoice,
        }
    }
}

impl Default for TaxSettings {
    fn default() -> Self {
        let rate = default_tax_rate();
        Self {
            quotation: rate,
            invoice: rate,
        }
    }
}

/// Used when a kind has no configured rate.
pub fn default_tax_rate() -> TaxRate {
    TaxRate::IVA_GENERAL
}

impl SalesDocumentsConfig {
    pub fn from_env() -> Result<Self, AppError> {
        dotenv().ok();

        let mut common = core_config::Config::load()?;
        if let Ok(level) = env::var("LOG_LEVEL") {
            common.log_level = level;
        }
        if let Ok(endpoint) = env::var("OTLP_ENDPOINT") {
            common.otlp_endpoint = Some(endpoint).filter(|e| !e.is_empty());
        }

        Ok(Self {
            common,
            service_name: env::var("SERVICE_NAME")
                .unwrap_or_else(|_| "sales-documents".to_string()),
            api: ApiSettings {
                base_url: env::var("API_URL")
                    .unwrap_or_else(|_| "http://localhost:5000/api".to_string()),
                token: env::var("API_TOKEN")
                    .ok()
                    .filter(|t| !t.is_empty())
                    .map(Secret::new),
                timeout_secs: env::var("API_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            },
            tax: TaxSettings {
                quotation: tax_rate_from_env("QUOTATION_TAX_RATE")?,
                invoice: tax_rate_from_env("INVOICE_TAX_RATE")?,
            },
        })
    }
}

fn tax_rate_from_env(var: &str) -> Result<TaxRate, AppError> {
    match env::var(var) {
        Ok(value) => value
            .parse()
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!("{}: {}", var, e))),
        Err(_) => Ok(default_tax_rate()),
    }
}
