pub mod pending;
pub mod tracker;

pub use pending::{is_preview_url, AssetState, LocalFile, PendingAsset, StoredAsset};
pub use tracker::{AssetTracker, ListItem, TrackedField, TrackedSlot, TrackerError};
