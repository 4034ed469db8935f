//! In-process stores for tests and local development.
//! Every call is recorded and failures can be injected per operation.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::{AssetStore, DocumentStore, StoreError, UploadedAsset};
use crate::asset::LocalFile;
use crate::content::SectionName;

#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    documents: RwLock<BTreeMap<SectionName, Value>>,
    persist_calls: AtomicUsize,
    fail_persist: AtomicBool,
    silent_persist: AtomicBool,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, section: SectionName, document: Value) {
        self.documents.write().await.insert(section, document);
    }

    pub async fn get(&self, section: &SectionName) -> Option<Value> {
        self.documents.read().await.get(section).cloned()
    }

    pub fn persist_calls(&self) -> usize {
        self.persist_calls.load(Ordering::SeqCst)
    }

    /// Make every following `persist` fail without writing.
    pub fn fail_persist(&self, fail: bool) {
        self.fail_persist.store(fail, Ordering::SeqCst);
    }

    /// Answer `persist` with an empty body, like sections that return bare 2xx.
    pub fn silent_persist(&self, silent: bool) {
        self.silent_persist.store(silent, Ordering::SeqCst);
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn fetch(&self, section: &SectionName) -> Result<Value, StoreError> {
        self.get(section)
            .await
            .ok_or_else(|| StoreError::NotFound(section.to_string()))
    }

    async fn persist(
        &self,
        section: &SectionName,
        document: &Value,
    ) -> Result<Option<Value>, StoreError> {
        self.persist_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_persist.load(Ordering::SeqCst) {
            return Err(StoreError::Status {
                status: 500,
                body: "persist rejected".to_string(),
            });
        }
        self.insert(section.clone(), document.clone()).await;
        if self.silent_persist.load(Ordering::SeqCst) {
            Ok(None)
        } else {
            Ok(Some(document.clone()))
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryAssetStore {
    assets: RwLock<BTreeMap<String, String>>,
    uploaded: RwLock<Vec<String>>,
    delete_calls: RwLock<Vec<String>>,
    next_id: AtomicUsize,
    fail_uploads: AtomicBool,
    failing_deletes: RwLock<HashSet<String>>,
}

impl MemoryAssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an asset as if it had been uploaded earlier.
    pub async fn seed(&self, public_id: &str, url: &str) {
        self.assets
            .write()
            .await
            .insert(public_id.to_string(), url.to_string());
    }

    pub async fn contains(&self, public_id: &str) -> bool {
        self.assets.read().await.contains_key(public_id)
    }

    /// File names passed to `upload`, in call order.
    pub async fn uploaded(&self) -> Vec<String> {
        self.uploaded.read().await.clone()
    }

    /// Public ids passed to `delete`, in call order.
    pub async fn delete_calls(&self) -> Vec<String> {
        self.delete_calls.read().await.clone()
    }

    pub fn fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    pub async fn fail_delete_of(&self, public_id: &str) {
        self.failing_deletes
            .write()
            .await
            .insert(public_id.to_string());
    }
}

#[async_trait]
impl AssetStore for MemoryAssetStore {
    async fn upload(&self, file: &LocalFile) -> Result<UploadedAsset, StoreError> {
        self.uploaded.write().await.push(file.name.clone());
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(StoreError::Transport(format!(
                "upload of {} refused",
                file.name
            )));
        }
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let public_id = format!("asset-{n}");
        let url = format!("memory://assets/{public_id}/{}", file.name);
        self.assets
            .write()
            .await
            .insert(public_id.clone(), url.clone());
        Ok(UploadedAsset { url, public_id })
    }

    async fn delete(&self, public_id: &str) -> Result<(), StoreError> {
        self.delete_calls.write().await.push(public_id.to_string());
        if self.failing_deletes.read().await.contains(public_id) {
            return Err(StoreError::Status {
                status: 500,
                body: format!("could not delete {public_id}"),
            });
        }
        self.assets.write().await.remove(public_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio_test::{assert_err, assert_ok};

    #[tokio::test]
    async fn document_round_trip_and_failure() {
        let store = MemoryDocumentStore::new();
        let about = SectionName::parse("about").unwrap();

        assert!(matches!(
            store.fetch(&about).await,
            Err(StoreError::NotFound(_))
        ));

        let saved = store.persist(&about, &json!({"a": 1})).await.unwrap();
        assert_eq!(saved, Some(json!({"a": 1})));
        assert_eq!(store.fetch(&about).await.unwrap(), json!({"a": 1}));

        store.fail_persist(true);
        assert!(store.persist(&about, &json!({"a": 2})).await.is_err());
        assert_eq!(store.fetch(&about).await.unwrap(), json!({"a": 1}));
        assert_eq!(store.persist_calls(), 2);
    }

    #[tokio::test]
    async fn asset_upload_and_idempotent_delete() {
        let store = MemoryAssetStore::new();
        let uploaded = store
            .upload(&LocalFile::new("villa.jpg", vec![0u8; 4]))
            .await
            .unwrap();
        assert_eq!(uploaded.public_id, "asset-1");
        assert!(store.contains("asset-1").await);

        assert_ok!(store.delete("asset-1").await);
        assert_ok!(store.delete("asset-1").await);
        assert!(!store.contains("asset-1").await);
        assert_eq!(store.delete_calls().await, vec!["asset-1", "asset-1"]);
    }

    #[tokio::test]
    async fn injected_failures() {
        let store = MemoryAssetStore::new();
        store.fail_delete_of("x").await;
        assert_err!(store.delete("x").await);

        store.fail_uploads(true);
        assert!(store.upload(&LocalFile::new("a.jpg", vec![])).await.is_err());
        assert_eq!(store.uploaded().await, vec!["a.jpg"]);
    }
}
