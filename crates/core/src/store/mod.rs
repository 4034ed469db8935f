//! Contracts of the two external collaborators: the Document Store that
//! holds section documents and the Asset Store that holds images.

pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::asset::LocalFile;
use crate::content::SectionName;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("could not decode response: {0}")]
    Decode(String),

    #[error("not found: {0}")]
    NotFound(String),
}

/// What the Asset Store returns for an upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedAsset {
    pub url: String,
    pub public_id: String,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch the full document for a section.
    async fn fetch(&self, section: &SectionName) -> Result<Value, StoreError>;

    /// Replace the full document for a section.
    ///
    /// Returns the stored document when the store echoes one back.
    async fn persist(&self, section: &SectionName, document: &Value)
        -> Result<Option<Value>, StoreError>;
}

#[async_trait]
pub trait AssetStore: Send + Sync {
    async fn upload(&self, file: &LocalFile) -> Result<UploadedAsset, StoreError>;

    /// Delete by public id. Unknown ids are not an error.
    async fn delete(&self, public_id: &str) -> Result<(), StoreError>;
}
