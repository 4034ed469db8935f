use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Save lifecycle events, consumed by whatever shows progress and notices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum AdminEvent {
    SaveStarted(SaveStarted),
    AssetDeleted { public_id: String },
    AssetDeleteFailed { public_id: String, reason: String },
    AssetUploaded { public_id: String, url: String },
    DocumentSaved(DocumentSaved),
    SaveFailed(SaveFailed),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveStarted {
    pub section: String,
    pub pending_uploads: usize,
    pub pending_deletes: usize,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSaved {
    pub section: String,
    pub uploaded: usize,
    pub deleted: usize,
    pub timestamp: DateTime<Utc>,
}

/// `message` is the generic notice shown to the editor; `cause` is for logs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveFailed {
    pub section: String,
    pub message: String,
    pub cause: String,
    pub timestamp: DateTime<Utc>,
}
