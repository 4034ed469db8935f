use std::sync::Arc;

use async_trait::async_trait;
use estate_cms_core::{
    AssetStore, DocumentStore, EventBus, LocalFile, SaveOrchestrator, SectionName, StoreError,
    UploadedAsset,
};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde_json::{json, Value};

use crate::config::ClientConfig;
use crate::error::{decode, ensure_success, status_error, transport, ClientError, ClientResult};
use crate::routes::Routes;

/// Multipart field the Asset Store reads the image from.
const UPLOAD_FIELD: &str = "image";

/// HTTP client for the content backend. Implements both store contracts.
/// Wrapped in `Arc` so cloning is cheap.
#[derive(Clone)]
pub struct HttpContentClient {
    inner: Arc<InnerClient>,
}

struct InnerClient {
    http: reqwest::Client,
    routes: Routes,
    config: ClientConfig,
}

impl HttpContentClient {
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &config.api_token {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| ClientError::InvalidToken)?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        let http = reqwest::Client::builder().default_headers(headers).build()?;
        Ok(Self {
            inner: Arc::new(InnerClient {
                http,
                routes: Routes::new(&config.base_url),
                config,
            }),
        })
    }

    pub fn from_env() -> ClientResult<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn routes(&self) -> &Routes {
        &self.inner.routes
    }

    /// A save orchestrator that talks to this backend for documents and images.
    pub fn orchestrator(&self) -> SaveOrchestrator {
        let store = Arc::new(self.clone());
        SaveOrchestrator::with_events(
            store.clone(),
            store,
            EventBus::new(self.inner.config.event_bus_capacity),
        )
    }

    fn http(&self) -> &reqwest::Client {
        &self.inner.http
    }
}

#[async_trait]
impl DocumentStore for HttpContentClient {
    async fn fetch(&self, section: &SectionName) -> Result<Value, StoreError> {
        let url = self.routes().section(section);
        let response = self.http().get(&url).send().await.map_err(transport)?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(section.to_string()));
        }
        let response = ensure_success(response).await?;
        response.json::<Value>().await.map_err(decode)
    }

    async fn persist(
        &self,
        section: &SectionName,
        document: &Value,
    ) -> Result<Option<Value>, StoreError> {
        let url = self.routes().section(section);
        let response = self
            .http()
            .post(&url)
            .json(document)
            .send()
            .await
            .map_err(transport)?;
        let response = ensure_success(response).await?;
        let body = response.bytes().await.map_err(transport)?;
        // Some sections answer with the saved document, others with an empty
        // or status-only body.
        let saved = serde_json::from_slice::<Value>(&body)
            .ok()
            .filter(Value::is_object);
        tracing::debug!(%section, echoed = saved.is_some(), "document persisted");
        Ok(saved)
    }
}

#[async_trait]
impl AssetStore for HttpContentClient {
    async fn upload(&self, file: &LocalFile) -> Result<UploadedAsset, StoreError> {
        let mut part = Part::bytes(file.bytes.clone()).file_name(file.name.clone());
        if let Some(content_type) = &file.content_type {
            part = part.mime_str(content_type).map_err(|err| {
                StoreError::Transport(format!("invalid content type {content_type:?}: {err}"))
            })?;
        }
        let form = Form::new().part(UPLOAD_FIELD, part);

        let response = self
            .http()
            .post(self.routes().upload())
            .multipart(form)
            .send()
            .await
            .map_err(transport)?;
        let response = ensure_success(response).await?;
        response.json::<UploadedAsset>().await.map_err(decode)
    }

    async fn delete(&self, public_id: &str) -> Result<(), StoreError> {
        let response = self
            .http()
            .post(self.routes().delete_image())
            .json(&json!({ "publicId": public_id }))
            .send()
            .await
            .map_err(transport)?;
        let status = response.status();
        if status.is_success() || status == StatusCode::NOT_FOUND {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(status_error(status, body))
    }
}
