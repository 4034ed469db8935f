pub mod orchestrator;

use thiserror::Error;

use crate::content::{ContentDocument, PathError, SectionName};
use crate::store::StoreError;
use crate::AssetTracker;

pub use orchestrator::SaveOrchestrator;

/// Notice shown to the editor for any failed save.
pub const SAVE_FAILED_NOTICE: &str = "Save failed";

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("a save of {0} is already running")]
    AlreadySaving(SectionName),

    #[error("upload of {file} failed: {source}")]
    Upload {
        file: String,
        #[source]
        source: StoreError,
    },

    #[error("could not place assets into the document: {0}")]
    Assemble(#[from] PathError),

    #[error("could not encode an image record: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("persisting {section} failed: {source}")]
    Persist {
        section: SectionName,
        #[source]
        source: StoreError,
    },
}

impl SaveError {
    /// What the editor sees. Causes are logged, not shown.
    pub fn notice(&self) -> &'static str {
        SAVE_FAILED_NOTICE
    }
}

/// A persisted document together with a tracker reset to clean state.
#[derive(Debug, Clone)]
pub struct SavedDocument {
    pub document: ContentDocument,
    pub tracker: AssetTracker,
}
