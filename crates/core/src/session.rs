//! The generic admin form: one section's working copy plus its image edits.

use serde_json::Value;
use thiserror::Error;

use crate::asset::{AssetTracker, TrackerError};
use crate::content::{
    normalize, BlockTag, ContentDocument, FieldPath, PathError, SectionSchema, TextBlock,
};
use crate::save::{SaveError, SaveOrchestrator};
use crate::store::{DocumentStore, StoreError};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("loading {section} failed: {source}")]
    Load {
        section: String,
        #[source]
        source: StoreError,
    },
    #[error("{0} is not a text field of this section")]
    NotText(FieldPath),
    #[error(transparent)]
    Path(#[from] PathError),
    #[error(transparent)]
    Tracker(#[from] TrackerError),
    #[error(transparent)]
    Save(#[from] SaveError),
}

#[derive(Debug, Clone)]
pub struct EditSession {
    schema: SectionSchema,
    document: ContentDocument,
    /// Body as last loaded or saved.
    baseline: Value,
    assets: AssetTracker,
}

impl EditSession {
    /// Fetch the section and prepare it for editing.
    pub async fn load(store: &dyn DocumentStore, schema: SectionSchema) -> Result<Self, SessionError> {
        let section = schema.section().clone();
        let body = store
            .fetch(&section)
            .await
            .map_err(|source| SessionError::Load {
                section: section.to_string(),
                source,
            })?;
        tracing::debug!(%section, "section loaded");
        Ok(Self::from_body(schema, body))
    }

    /// Prepare an already-fetched body for editing.
    ///
    /// Every text field is rewritten in place as a `{tag, text}` object. A
    /// field whose parent holds something other than an object or array is
    /// left as loaded.
    pub fn from_body(schema: SectionSchema, mut body: Value) -> Self {
        if !body.is_object() {
            body = Value::Object(serde_json::Map::new());
        }
        for field in schema.text_fields() {
            let block = normalize(field.path.get(&body), field.default_tag);
            if let Err(err) = field.path.set(&mut body, block.to_value()) {
                tracing::warn!(
                    section = %schema.section(),
                    path = %field.path,
                    error = %err,
                    "text field does not fit the document shape, left as loaded"
                );
            }
        }
        let assets = AssetTracker::from_document(&schema, &body);
        let document = ContentDocument::new(schema.section().clone(), body.clone());
        Self {
            schema,
            document,
            baseline: body,
            assets,
        }
    }

    pub fn schema(&self) -> &SectionSchema {
        &self.schema
    }

    pub fn document(&self) -> &ContentDocument {
        &self.document
    }

    pub fn assets(&self) -> &AssetTracker {
        &self.assets
    }

    pub fn assets_mut(&mut self) -> &mut AssetTracker {
        &mut self.assets
    }

    pub fn text(&self, path: &FieldPath) -> Result<TextBlock, SessionError> {
        let field = self
            .schema
            .text_field(path)
            .ok_or_else(|| SessionError::NotText(path.clone()))?;
        Ok(normalize(path.get(&self.document.body), field.default_tag))
    }

    pub fn set_text(&mut self, path: &FieldPath, text: &str) -> Result<(), SessionError> {
        let mut block = self.text(path)?;
        block.text = text.to_string();
        path.set(&mut self.document.body, block.to_value())?;
        Ok(())
    }

    pub fn set_tag(&mut self, path: &FieldPath, tag: BlockTag) -> Result<(), SessionError> {
        let mut block = self.text(path)?;
        block.tag = tag;
        path.set(&mut self.document.body, block.to_value())?;
        Ok(())
    }

    pub fn value(&self, path: &FieldPath) -> Option<&Value> {
        path.get(&self.document.body)
    }

    /// Write an arbitrary value, for fields that are neither text blocks nor images.
    pub fn set_value(&mut self, path: &FieldPath, value: Value) -> Result<(), SessionError> {
        path.set(&mut self.document.body, value)?;
        Ok(())
    }

    pub fn remove_value(&mut self, path: &FieldPath) -> Option<Value> {
        path.remove(&mut self.document.body)
    }

    /// Any text, value or image change since load or the last save.
    pub fn is_dirty(&self) -> bool {
        self.document.body != self.baseline || self.assets.is_dirty()
    }

    /// Save through `orchestrator`. On success the working copy and tracker
    /// are replaced by the persisted state; on failure both stay as they were.
    pub async fn save(&mut self, orchestrator: &SaveOrchestrator) -> Result<(), SessionError> {
        let saved = orchestrator.save(&self.document, &self.assets).await?;
        self.baseline = saved.document.body.clone();
        self.document = saved.document;
        self.assets = saved.tracker;
        Ok(())
    }
}
