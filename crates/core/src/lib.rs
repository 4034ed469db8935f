//! Content-editing core for the estate marketing site's admin panel.
//!
//! Admin forms fetch a section document, normalize its text fields into
//! [`content::TextBlock`]s, track image edits with an
//! [`asset::AssetTracker`], and save through a [`save::SaveOrchestrator`].

pub mod asset;
pub mod content;
pub mod events;
pub mod save;
pub mod session;
pub mod store;

pub use asset::{AssetState, AssetTracker, LocalFile, PendingAsset, StoredAsset, TrackerError};
pub use content::{BlockTag, ContentDocument, FieldPath, SectionName, SectionSchema, TextBlock};
pub use events::bus::EventBus;
pub use save::{SaveError, SaveOrchestrator, SavedDocument};
pub use session::{EditSession, SessionError};
pub use store::{AssetStore, DocumentStore, StoreError, UploadedAsset};
