//! REST client for the quotation/invoice backend.
//!
//! Thin get/post/put/delete helpers over a resource path, plus the
//! [`DocumentStore`] implementation built on them. The backend may answer
//! either with the bare resource or wrapped in an envelope such as
//! `{"status": "success", "factura": {...}}`; both are accepted.

use crate::config::ApiSettings;
use crate::dtos::{SaveConfirmation, StoredDocument};
use crate::models::{DocumentHeader, DocumentKind};
use crate::services::metrics::{BACKEND_ERRORS_TOTAL, BACKEND_REQUEST_DURATION};
use crate::services::store::DocumentStore;
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use service_core::error::AppError;
use service_core::observability::{TracedClientExt, TracedRequest};
use std::time::{Duration, Instant};
use tracing::instrument;
use uuid::Uuid;

pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<Secret<String>>,
}

impl ApiClient {
    pub fn new(settings: &ApiSettings) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            token: settings.token.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Attach the bearer token, if any, and a fresh correlation id.
    fn authorize(&self, request: TracedRequest) -> TracedRequest {
        let request = request.request_id(Uuid::new_v4().to_string());
        match &self.token {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        }
    }

    #[instrument(skip(self))]
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, AppError> {
        let request = self.authorize(self.client.traced_get(&self.url(path)));
        let response = self.send("get", path, request).await?;
        response.json().await.map_err(transport_error)
    }

    #[instrument(skip(self, body))]
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, AppError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let request = self.authorize(self.client.traced_post(&self.url(path)).json(body));
        let response = self.send("post", path, request).await?;
        response.json().await.map_err(transport_error)
    }

    #[instrument(skip(self, body))]
    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, AppError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let request = self.authorize(self.client.traced_put(&self.url(path)).json(body));
        let response = self.send("put", path, request).await?;
        response.json().await.map_err(transport_error)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, path: &str) -> Result<(), AppError> {
        let request = self.authorize(self.client.traced_delete(&self.url(path)));
        self.send("delete", path, request).await?;
        Ok(())
    }

    /// All documents of one kind, as the list views show them.
    pub async fn list<H: DocumentHeader>(&self) -> Result<Vec<StoredDocument<H>>, AppError> {
        let body: Value = self.get(H::KIND.resource_path()).await?;
        let payload = unwrap_envelope(body, H::KIND.collection_key());
        Ok(serde_json::from_value(payload)?)
    }

    pub async fn delete_document(&self, kind: DocumentKind, id: &str) -> Result<(), AppError> {
        self.delete(&format!("{}/{}", kind.resource_path(), id))
            .await
    }

    async fn send(
        &self,
        operation: &'static str,
        path: &str,
        request: TracedRequest,
    ) -> Result<Response, AppError> {
        let start = Instant::now();
        let result = request.send().await;
        BACKEND_REQUEST_DURATION
            .with_label_values(&[operation])
            .observe(start.elapsed().as_secs_f64());

        let outcome = match result {
            Ok(response) if response.status().is_success() => Ok(response),
            Ok(response) => Err(status_error(response).await),
            Err(e) => Err(transport_error(e)),
        };

        if let Err(e) = &outcome {
            BACKEND_ERRORS_TOTAL
                .with_label_values(&[operation, e.kind()])
                .inc();
            if e.is_client_error() {
                tracing::warn!(operation, path, error = %e, "Backend rejected request");
            } else {
                tracing::error!(operation, path, error = %e, "Backend request failed");
            }
        }
        outcome
    }
}

#[async_trait]
impl DocumentStore for ApiClient {
    async fn load<H: DocumentHeader>(&self, id: &str) -> Result<StoredDocument<H>, AppError> {
        let path = format!("{}/{}", H::KIND.resource_path(), id);
        let body: Value = self.get(&path).await?;

        let mut document: StoredDocument<H> =
            serde_json::from_value(unwrap_envelope(body, H::KIND.singular_key()))?;
        if document.id.is_none() {
            document.id = Some(id.to_string());
        }
        Ok(document)
    }

    async fn save<H: DocumentHeader>(
        &self,
        document: &StoredDocument<H>,
    ) -> Result<SaveConfirmation, AppError> {
        let kind = H::KIND;
        match &document.id {
            Some(id) => {
                let path = format!("{}/{}", kind.resource_path(), id);
                let _: Value = self.put(&path, document).await?;
                Ok(SaveConfirmation { id: id.clone() })
            }
            None => {
                let body: Value = self.post(kind.resource_path(), document).await?;
                let id = created_id(&body, kind).ok_or_else(|| {
                    AppError::BadGateway(format!(
                        "Backend did not return an id for the new {}",
                        kind.as_str()
                    ))
                })?;
                Ok(SaveConfirmation { id })
            }
        }
    }
}

/// The resource under `key` when `body` is an envelope object, else `body`.
fn unwrap_envelope(body: Value, key: &str) -> Value {
    match body {
        Value::Object(mut map) if map.contains_key(key) => map.remove(key).unwrap_or(Value::Null),
        other => other,
    }
}

/// Id of a freshly created document: `id`, `_id`, `<kind>_id`, or the id
/// of an enveloped resource.
fn created_id(body: &Value, kind: DocumentKind) -> Option<String> {
    let scalar = |value: &Value| match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    };
    let own_key = format!("{}_id", kind.singular_key());

    ["id", "_id", own_key.as_str()]
        .iter()
        .find_map(|key| body.get(key).and_then(scalar))
        .or_else(|| {
            let nested = body.get(kind.singular_key())?;
            ["id", "_id"]
                .iter()
                .find_map(|key| nested.get(key).and_then(scalar))
        })
}

async fn status_error(response: Response) -> AppError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string());

    match status {
        StatusCode::NOT_FOUND => AppError::NotFound(anyhow::anyhow!(message)),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            AppError::Unauthorized(anyhow::anyhow!(message))
        }
        StatusCode::CONFLICT => AppError::Conflict(anyhow::anyhow!(message)),
        s if s.is_client_error() => AppError::BadRequest(anyhow::anyhow!(message)),
        s => AppError::BadGateway(format!("Backend returned {}: {}", s, message)),
    }
}

fn transport_error(err: reqwest::Error) -> AppError {
    AppError::BadGateway(format!("HTTP request failed: {}", err))
}
