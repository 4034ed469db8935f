//! Turns a working copy plus pending image edits into one persisted document.
//!
//! Order: best-effort deletes, uploads, assembly, persist, tracker reset.
//! The caller's working copy and tracker are only borrowed, so a failed save
//! leaves them exactly as they were.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use futures::future::join_all;
use serde_json::Value;

use super::{SaveError, SavedDocument, SAVE_FAILED_NOTICE};
use crate::asset::{AssetTracker, ListItem, LocalFile, PendingAsset, StoredAsset, TrackedSlot};
use crate::content::{ContentDocument, SectionName};
use crate::events::bus::EventBus;
use crate::events::{AdminEvent, DocumentSaved, SaveFailed, SaveStarted};
use crate::store::{AssetStore, DocumentStore, UploadedAsset};

/// Position of an asset inside a tracker: field index, element index.
type AssetKey = (usize, usize);

pub struct SaveOrchestrator {
    documents: Arc<dyn DocumentStore>,
    assets: Arc<dyn AssetStore>,
    events: EventBus,
    in_flight: Mutex<HashSet<SectionName>>,
}

impl SaveOrchestrator {
    pub fn new(documents: Arc<dyn DocumentStore>, assets: Arc<dyn AssetStore>) -> Self {
        Self::with_events(documents, assets, EventBus::default())
    }

    pub fn with_events(
        documents: Arc<dyn DocumentStore>,
        assets: Arc<dyn AssetStore>,
        events: EventBus,
    ) -> Self {
        Self {
            documents,
            assets,
            events,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn documents(&self) -> &Arc<dyn DocumentStore> {
        &self.documents
    }

    pub fn is_saving(&self, section: &SectionName) -> bool {
        self.lock_in_flight().contains(section)
    }

    /// Save `document` with the image edits in `tracker`.
    ///
    /// A second save of the same section while one is running returns
    /// [`SaveError::AlreadySaving`] without touching either store.
    pub async fn save(
        &self,
        document: &ContentDocument,
        tracker: &AssetTracker,
    ) -> Result<SavedDocument, SaveError> {
        let section = &document.section;
        let Some(_guard) = InFlight::enter(self, section) else {
            tracing::debug!(%section, "save ignored, one is already running");
            return Err(SaveError::AlreadySaving(section.clone()));
        };

        let result = self.run(document, tracker).await;
        if let Err(err) = &result {
            tracing::error!(%section, error = %err, "save failed");
            self.events.notify(AdminEvent::SaveFailed(SaveFailed {
                section: section.to_string(),
                message: SAVE_FAILED_NOTICE.to_string(),
                cause: err.to_string(),
                timestamp: Utc::now(),
            }));
        }
        result
    }

    async fn run(
        &self,
        document: &ContentDocument,
        tracker: &AssetTracker,
    ) -> Result<SavedDocument, SaveError> {
        let section = &document.section;
        let deletions = tracker.deletion_set();
        let jobs = upload_jobs(tracker);

        tracing::info!(
            %section,
            uploads = jobs.len(),
            deletes = deletions.len(),
            "saving section"
        );
        self.events.notify(AdminEvent::SaveStarted(SaveStarted {
            section: section.to_string(),
            pending_uploads: jobs.len(),
            pending_deletes: deletions.len(),
            timestamp: Utc::now(),
        }));

        let mut deleted = 0;
        for public_id in &deletions {
            match self.assets.delete(public_id).await {
                Ok(()) => {
                    deleted += 1;
                    tracing::debug!(%public_id, "asset deleted");
                    self.events.notify(AdminEvent::AssetDeleted {
                        public_id: public_id.clone(),
                    });
                }
                Err(err) => {
                    tracing::warn!(%public_id, error = %err, "asset delete failed, continuing");
                    self.events.notify(AdminEvent::AssetDeleteFailed {
                        public_id: public_id.clone(),
                        reason: err.to_string(),
                    });
                }
            }
        }

        let uploaded = self.upload_all(&jobs).await?;
        let uploaded_count = uploaded.len();
        let mut uploaded: HashMap<AssetKey, UploadedAsset> = uploaded.into_iter().collect();

        let mut body = document.body.clone();
        for (field_index, field) in tracker.fields().iter().enumerate() {
            let existing = field.path.get(&document.body);
            let value = match &field.slot {
                TrackedSlot::Single(slot) => {
                    match slot
                        .as_ref()
                        .and_then(|asset| finalize(asset, (field_index, 0), &mut uploaded))
                    {
                        Some(stored) => stored.merge_into(existing)?,
                        None => Value::Null,
                    }
                }
                TrackedSlot::List { items, .. } => {
                    let existing = existing.and_then(Value::as_array);
                    let mut elements = Vec::with_capacity(items.len());
                    for (i, item) in items.iter().enumerate() {
                        let original = existing.and_then(|array| array.get(i));
                        match item {
                            ListItem::Untracked => elements.extend(original.cloned()),
                            ListItem::Discarded => {}
                            ListItem::Image(asset) => {
                                if let Some(stored) = finalize(asset, (field_index, i), &mut uploaded) {
                                    elements.push(stored.merge_into(original)?);
                                }
                            }
                        }
                    }
                    Value::Array(elements)
                }
            };
            field.path.set(&mut body, value)?;
        }

        let response = self
            .documents
            .persist(section, &body)
            .await
            .map_err(|source| SaveError::Persist {
                section: section.clone(),
                source,
            })?;

        let saved_body = match response {
            Some(saved) if saved.is_object() => saved,
            _ => body,
        };
        let tracker = tracker.reset_from(&saved_body);

        tracing::info!(%section, uploaded = uploaded_count, deleted, "section saved");
        self.events.notify(AdminEvent::DocumentSaved(DocumentSaved {
            section: section.to_string(),
            uploaded: uploaded_count,
            deleted,
            timestamp: Utc::now(),
        }));

        Ok(SavedDocument {
            document: ContentDocument::new(section.clone(), saved_body),
            tracker,
        })
    }

    /// Run every upload to completion. The first failure fails the save, and
    /// images that did reach the store are logged since nothing will use them.
    async fn upload_all(
        &self,
        jobs: &[(AssetKey, &LocalFile)],
    ) -> Result<Vec<(AssetKey, UploadedAsset)>, SaveError> {
        let results = join_all(jobs.iter().map(|(key, file)| self.upload(*key, file))).await;

        let mut uploaded = Vec::with_capacity(results.len());
        let mut failure = None;
        for result in results {
            match result {
                Ok(done) => uploaded.push(done),
                Err(err) => {
                    failure.get_or_insert(err);
                }
            }
        }
        match failure {
            None => Ok(uploaded),
            Some(err) => {
                for (_, orphan) in &uploaded {
                    tracing::warn!(
                        public_id = %orphan.public_id,
                        "uploaded asset left unreferenced by failed save"
                    );
                }
                Err(err)
            }
        }
    }

    async fn upload(
        &self,
        key: AssetKey,
        file: &LocalFile,
    ) -> Result<(AssetKey, UploadedAsset), SaveError> {
        let uploaded = self
            .assets
            .upload(file)
            .await
            .map_err(|source| SaveError::Upload {
                file: file.name.clone(),
                source,
            })?;
        tracing::debug!(file = %file.name, public_id = %uploaded.public_id, "asset uploaded");
        self.events.notify(AdminEvent::AssetUploaded {
            public_id: uploaded.public_id.clone(),
            url: uploaded.url.clone(),
        });
        Ok((key, uploaded))
    }

    fn lock_in_flight(&self) -> std::sync::MutexGuard<'_, HashSet<SectionName>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn upload_jobs(tracker: &AssetTracker) -> Vec<(AssetKey, &LocalFile)> {
    let mut jobs = Vec::new();
    for (field_index, field) in tracker.fields().iter().enumerate() {
        match &field.slot {
            TrackedSlot::Single(slot) => {
                if let Some(file) = slot.as_ref().and_then(PendingAsset::file) {
                    jobs.push(((field_index, 0), file));
                }
            }
            TrackedSlot::List { items, .. } => {
                for (i, item) in items.iter().enumerate() {
                    if let Some(file) = item.image().and_then(PendingAsset::file) {
                        jobs.push(((field_index, i), file));
                    }
                }
            }
        }
    }
    jobs
}

/// The record to write for one asset, or `None` if it leaves the document.
fn finalize(
    asset: &PendingAsset,
    key: AssetKey,
    uploaded: &mut HashMap<AssetKey, UploadedAsset>,
) -> Option<StoredAsset> {
    if asset.is_new() {
        let remote = uploaded.remove(&key)?;
        return Some(StoredAsset {
            url: remote.url,
            public_id: Some(remote.public_id),
            alt: asset.alt.clone(),
        });
    }
    asset.as_stored()
}

/// Marks a section as saving until dropped.
struct InFlight<'a> {
    owner: &'a SaveOrchestrator,
    section: SectionName,
}

impl<'a> InFlight<'a> {
    fn enter(owner: &'a SaveOrchestrator, section: &SectionName) -> Option<Self> {
        if !owner.lock_in_flight().insert(section.clone()) {
            return None;
        }
        Some(Self {
            owner,
            section: section.clone(),
        })
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.owner.lock_in_flight().remove(&self.section);
    }
}
