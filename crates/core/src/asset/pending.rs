//! Client-side lifecycle of one image between document load and save.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

const PREVIEW_URL_PREFIX: &str = "blob:estate-cms/";

/// A file picked by the editor that has not been uploaded yet.
#[derive(Clone, PartialEq, Eq)]
pub struct LocalFile {
    pub name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl LocalFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            content_type: None,
            bytes: bytes.into(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

impl fmt::Debug for LocalFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalFile")
            .field("name", &self.name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// The image record stored inside content documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredAsset {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_id: Option<String>,
    #[serde(default)]
    pub alt: String,
}

impl StoredAsset {
    /// Read an image record, accepting the legacy bare-URL form.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(url) if !url.is_empty() => Some(Self {
                url: url.clone(),
                public_id: None,
                alt: String::new(),
            }),
            Value::Object(map) => {
                let url = map.get("url").and_then(Value::as_str).filter(|u| !u.is_empty())?;
                Some(Self {
                    url: url.to_string(),
                    public_id: map
                        .get("publicId")
                        .and_then(Value::as_str)
                        .filter(|id| !id.is_empty())
                        .map(str::to_string),
                    alt: map
                        .get("alt")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                })
            }
            _ => None,
        }
    }

    /// This record as document JSON, written over `existing` so keys the
    /// record does not own (captions, ordering) survive the save.
    pub fn merge_into(&self, existing: Option<&Value>) -> serde_json::Result<Value> {
        match (existing, serde_json::to_value(self)?) {
            (Some(Value::Object(base)), Value::Object(fields)) => {
                let mut merged = base.clone();
                merged.remove("publicId");
                merged.extend(fields);
                Ok(Value::Object(merged))
            }
            (_, record) => Ok(record),
        }
    }
}

/// Where an image stands relative to the Asset Store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetState {
    /// Stored remotely and untouched since load.
    Persisted {
        url: String,
        public_id: Option<String>,
    },
    /// A new file in a slot that had no stored image.
    Added { file: LocalFile, preview_url: String },
    /// A new file superseding a stored image that must be deleted on save.
    Replaced {
        file: LocalFile,
        preview_url: String,
        old_public_id: String,
    },
    /// A stored image the editor removed; hidden, deleted on save.
    MarkedForDeletion { public_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAsset {
    pub alt: String,
    pub state: AssetState,
}

impl PendingAsset {
    pub fn persisted(stored: StoredAsset) -> Self {
        Self {
            alt: stored.alt,
            state: AssetState::Persisted {
                url: stored.url,
                public_id: stored.public_id,
            },
        }
    }

    /// Wrap whatever the document holds at an image field.
    pub fn initialize_from_document(value: Option<&Value>) -> Option<Self> {
        value.and_then(StoredAsset::from_value).map(Self::persisted)
    }

    /// Put `file` in the slot currently held by `current`.
    ///
    /// The alt text survives, and the id of whichever stored image is being
    /// superseded moves forward into `old_public_id_to_delete`.
    pub fn attach_new_file(current: Option<&PendingAsset>, file: LocalFile) -> Self {
        let alt = current.map(|c| c.alt.clone()).unwrap_or_default();
        let preview_url = preview_url();
        let superseded = current.and_then(|c| match &c.state {
            AssetState::Persisted { public_id, .. } => public_id.clone(),
            AssetState::Replaced { old_public_id, .. } => Some(old_public_id.clone()),
            AssetState::MarkedForDeletion { public_id } => Some(public_id.clone()),
            AssetState::Added { .. } => None,
        });
        let state = match superseded {
            Some(old_public_id) => AssetState::Replaced {
                file,
                preview_url,
                old_public_id,
            },
            None => AssetState::Added { file, preview_url },
        };
        Self { alt, state }
    }

    /// Remove the image. `None` means nothing is left to clean up remotely.
    pub fn mark_deleted(&self) -> Option<Self> {
        let public_id = match &self.state {
            AssetState::Persisted {
                public_id: Some(id),
                ..
            } => id.clone(),
            // The replacement was never uploaded but the image it superseded
            // is still in the store.
            AssetState::Replaced { old_public_id, .. } => old_public_id.clone(),
            AssetState::MarkedForDeletion { .. } => return Some(self.clone()),
            AssetState::Persisted { public_id: None, .. } | AssetState::Added { .. } => {
                return None
            }
        };
        Some(Self {
            alt: self.alt.clone(),
            state: AssetState::MarkedForDeletion { public_id },
        })
    }

    pub fn update_alt(&self, alt: impl Into<String>) -> Self {
        Self {
            alt: alt.into(),
            state: self.state.clone(),
        }
    }

    /// Displayable URL. `None` once marked for deletion.
    pub fn url(&self) -> Option<&str> {
        match &self.state {
            AssetState::Persisted { url, .. } => Some(url),
            AssetState::Added { preview_url, .. } | AssetState::Replaced { preview_url, .. } => {
                Some(preview_url)
            }
            AssetState::MarkedForDeletion { .. } => None,
        }
    }

    pub fn file(&self) -> Option<&LocalFile> {
        match &self.state {
            AssetState::Added { file, .. } | AssetState::Replaced { file, .. } => Some(file),
            _ => None,
        }
    }

    pub fn public_id(&self) -> Option<&str> {
        match &self.state {
            AssetState::Persisted { public_id, .. } => public_id.as_deref(),
            AssetState::MarkedForDeletion { public_id } => Some(public_id),
            _ => None,
        }
    }

    pub fn old_public_id_to_delete(&self) -> Option<&str> {
        match &self.state {
            AssetState::Replaced { old_public_id, .. } => Some(old_public_id),
            _ => None,
        }
    }

    pub fn is_new(&self) -> bool {
        self.file().is_some()
    }

    pub fn is_marked_for_deletion(&self) -> bool {
        matches!(self.state, AssetState::MarkedForDeletion { .. })
    }

    pub fn is_clean(&self) -> bool {
        matches!(self.state, AssetState::Persisted { .. })
    }

    /// Public id the save must delete, if any.
    pub fn pending_deletion(&self) -> Option<&str> {
        match &self.state {
            AssetState::MarkedForDeletion { public_id } => Some(public_id),
            AssetState::Replaced { old_public_id, .. } => Some(old_public_id),
            _ => None,
        }
    }

    /// The stored record for an untouched image.
    pub fn as_stored(&self) -> Option<StoredAsset> {
        match &self.state {
            AssetState::Persisted { url, public_id } => Some(StoredAsset {
                url: url.clone(),
                public_id: public_id.clone(),
                alt: self.alt.clone(),
            }),
            _ => None,
        }
    }
}

fn preview_url() -> String {
    format!("{PREVIEW_URL_PREFIX}{}", Uuid::new_v4())
}

pub fn is_preview_url(url: &str) -> bool {
    url.starts_with(PREVIEW_URL_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn stored(id: &str) -> PendingAsset {
        PendingAsset::initialize_from_document(Some(&json!({
            "url": format!("http://cdn/{id}.jpg"),
            "publicId": id,
            "alt": "facade",
        })))
        .unwrap()
    }

    fn file(name: &str) -> LocalFile {
        LocalFile::new(name, vec![1, 2, 3]).with_content_type("image/jpeg")
    }

    #[test]
    fn initialize_persisted() {
        let asset = stored("abc123");
        assert!(asset.is_clean());
        assert!(!asset.is_new());
        assert!(!asset.is_marked_for_deletion());
        assert_eq!(asset.public_id(), Some("abc123"));
        assert_eq!(asset.url(), Some("http://cdn/abc123.jpg"));
        assert_eq!(asset.alt, "facade");
    }

    #[test]
    fn initialize_missing_or_empty() {
        assert_eq!(PendingAsset::initialize_from_document(None), None);
        assert_eq!(PendingAsset::initialize_from_document(Some(&Value::Null)), None);
        assert_eq!(PendingAsset::initialize_from_document(Some(&json!(""))), None);
        assert_eq!(
            PendingAsset::initialize_from_document(Some(&json!({"alt": "x"}))),
            None
        );
    }

    #[test]
    fn initialize_legacy_url_string() {
        let asset = PendingAsset::initialize_from_document(Some(&json!("http://cdn/a.png"))).unwrap();
        assert_eq!(asset.url(), Some("http://cdn/a.png"));
        assert_eq!(asset.public_id(), None);
    }

    #[test]
    fn attach_to_empty_slot_is_added() {
        let asset = PendingAsset::attach_new_file(None, file("a.jpg"));
        assert!(asset.is_new());
        assert!(matches!(asset.state, AssetState::Added { .. }));
        assert!(is_preview_url(asset.url().unwrap()));
        assert_eq!(asset.old_public_id_to_delete(), None);
    }

    #[test]
    fn replace_keeps_alt_and_old_id() {
        let replaced = PendingAsset::attach_new_file(Some(&stored("abc123")), file("b.jpg"));
        assert!(replaced.is_new());
        assert_eq!(replaced.alt, "facade");
        assert_eq!(replaced.old_public_id_to_delete(), Some("abc123"));
        assert_eq!(replaced.public_id(), None);
    }

    #[test]
    fn replace_twice_carries_old_id_forward() {
        let first = PendingAsset::attach_new_file(Some(&stored("abc123")), file("b.jpg"));
        let second = PendingAsset::attach_new_file(Some(&first), file("c.jpg"));
        assert_eq!(second.old_public_id_to_delete(), Some("abc123"));
        assert_eq!(second.file().unwrap().name, "c.jpg");
        assert_ne!(first.url(), second.url());
    }

    #[test]
    fn replace_unsaved_addition_stays_added() {
        let first = PendingAsset::attach_new_file(None, file("a.jpg"));
        let second = PendingAsset::attach_new_file(Some(&first), file("b.jpg"));
        assert!(matches!(second.state, AssetState::Added { .. }));
    }

    #[test]
    fn replace_after_delete_still_cleans_up() {
        let marked = stored("xyz").mark_deleted().unwrap();
        let replaced = PendingAsset::attach_new_file(Some(&marked), file("n.jpg"));
        assert_eq!(replaced.old_public_id_to_delete(), Some("xyz"));
    }

    #[test]
    fn delete_persisted_marks_it() {
        let marked = stored("xyz").mark_deleted().unwrap();
        assert!(marked.is_marked_for_deletion());
        assert_eq!(marked.public_id(), Some("xyz"));
        assert_eq!(marked.url(), None);
        assert_eq!(marked.pending_deletion(), Some("xyz"));
        assert_eq!(marked.mark_deleted(), Some(marked.clone()));
    }

    #[test]
    fn delete_unsaved_addition_drops_it() {
        let added = PendingAsset::attach_new_file(None, file("a.jpg"));
        assert_eq!(added.mark_deleted(), None);

        let legacy = PendingAsset::initialize_from_document(Some(&json!("http://cdn/a.png"))).unwrap();
        assert_eq!(legacy.mark_deleted(), None);
    }

    #[test]
    fn delete_replacement_marks_superseded_image() {
        let replaced = PendingAsset::attach_new_file(Some(&stored("abc123")), file("b.jpg"));
        let marked = replaced.mark_deleted().unwrap();
        assert_eq!(marked.state, AssetState::MarkedForDeletion { public_id: "abc123".into() });
    }

    #[test]
    fn update_alt_only_touches_alt() {
        let replaced = PendingAsset::attach_new_file(Some(&stored("abc123")), file("b.jpg"));
        let renamed = replaced.update_alt("Aerial view");
        assert_eq!(renamed.alt, "Aerial view");
        assert_eq!(renamed.state, replaced.state);
    }

    #[test]
    fn stored_asset_wire_format() {
        let record = StoredAsset {
            url: "http://cdn/a.jpg".into(),
            public_id: Some("a".into()),
            alt: String::new(),
        };
        assert_eq!(
            record.merge_into(None).unwrap(),
            json!({"url": "http://cdn/a.jpg", "publicId": "a", "alt": ""})
        );
        let legacy: StoredAsset = serde_json::from_value(json!({"url": "u"})).unwrap();
        assert_eq!(legacy.public_id, None);
        assert_eq!(legacy.alt, "");
    }

    #[test]
    fn merge_keeps_foreign_keys() {
        let record = StoredAsset {
            url: "http://cdn/new.jpg".into(),
            public_id: None,
            alt: "Marina".into(),
        };
        let existing = json!({"url": "http://x/old.jpg", "publicId": "old", "caption": "Dusk", "order": 1});
        assert_eq!(
            record.merge_into(Some(&existing)).unwrap(),
            json!({"url": "http://cdn/new.jpg", "alt": "Marina", "caption": "Dusk", "order": 1})
        );
        assert_eq!(
            record.merge_into(Some(&json!("http://x/legacy.jpg"))).unwrap(),
            json!({"url": "http://cdn/new.jpg", "alt": "Marina"})
        );
    }
}
