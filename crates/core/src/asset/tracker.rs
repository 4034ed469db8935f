use std::collections::BTreeSet;

use serde_json::Value;
use thiserror::Error;

use super::pending::{LocalFile, PendingAsset};
use crate::content::{AssetFieldKind, FieldPath, SectionSchema};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackerError {
    #[error("no image field tracked at {0}")]
    UnknownField(FieldPath),
    #[error("{path} is a {actual} image field")]
    WrongKind {
        path: FieldPath,
        actual: &'static str,
    },
    #[error("{path}: index {index} out of range (len {len})")]
    IndexOutOfRange {
        path: FieldPath,
        index: usize,
        len: usize,
    },
    #[error("{0} holds no image")]
    NoImage(FieldPath),
    #[error("{0} was removed")]
    Removed(FieldPath),
}

/// One position of a tracked image list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListItem {
    /// Held something other than an image at load. Saved as it was.
    Untracked,
    /// A loaded image removed without anything to delete remotely. Dropped on save.
    Discarded,
    Image(PendingAsset),
}

impl ListItem {
    pub fn image(&self) -> Option<&PendingAsset> {
        match self {
            ListItem::Image(asset) => Some(asset),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackedSlot {
    Single(Option<PendingAsset>),
    /// The first `loaded` items line up with the document array; images
    /// pushed since load follow them.
    List { items: Vec<ListItem>, loaded: usize },
}

impl TrackedSlot {
    fn load(kind: AssetFieldKind, raw: Option<&Value>) -> Self {
        match kind {
            AssetFieldKind::Single => {
                TrackedSlot::Single(PendingAsset::initialize_from_document(raw))
            }
            AssetFieldKind::List => {
                let items: Vec<ListItem> = raw
                    .and_then(Value::as_array)
                    .map(|elements| {
                        elements
                            .iter()
                            .map(|element| {
                                PendingAsset::initialize_from_document(Some(element))
                                    .map_or(ListItem::Untracked, ListItem::Image)
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                TrackedSlot::List {
                    loaded: items.len(),
                    items,
                }
            }
        }
    }

    pub fn kind(&self) -> AssetFieldKind {
        match self {
            TrackedSlot::Single(_) => AssetFieldKind::Single,
            TrackedSlot::List { .. } => AssetFieldKind::List,
        }
    }

    fn kind_name(&self) -> &'static str {
        match self {
            TrackedSlot::Single(_) => "single",
            TrackedSlot::List { .. } => "list",
        }
    }

    fn assets(&self) -> impl Iterator<Item = &PendingAsset> {
        let (single, list) = match self {
            TrackedSlot::Single(slot) => (slot.as_ref(), &[][..]),
            TrackedSlot::List { items, .. } => (None, items.as_slice()),
        };
        single.into_iter().chain(list.iter().filter_map(ListItem::image))
    }

    fn has_discarded(&self) -> bool {
        match self {
            TrackedSlot::Single(_) => false,
            TrackedSlot::List { items, .. } => items.contains(&ListItem::Discarded),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedField {
    pub path: FieldPath,
    pub slot: TrackedSlot,
}

/// Pending image state for every image field of one document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AssetTracker {
    fields: Vec<TrackedField>,
}

impl AssetTracker {
    /// Track every image field the schema declares, starting clean.
    pub fn from_document(schema: &SectionSchema, body: &Value) -> Self {
        let fields = schema
            .asset_fields()
            .iter()
            .map(|field| TrackedField {
                path: field.path.clone(),
                slot: TrackedSlot::load(field.kind, field.path.get(body)),
            })
            .collect();
        Self { fields }
    }

    /// Rebuild clean state for the same fields from a persisted body.
    pub fn reset_from(&self, body: &Value) -> Self {
        let fields = self
            .fields
            .iter()
            .map(|field| TrackedField {
                path: field.path.clone(),
                slot: TrackedSlot::load(field.slot.kind(), field.path.get(body)),
            })
            .collect();
        Self { fields }
    }

    pub fn fields(&self) -> &[TrackedField] {
        &self.fields
    }

    /// The image shown for a single field; `None` when empty or removed.
    pub fn current(&self, path: &FieldPath) -> Result<Option<&PendingAsset>, TrackerError> {
        let slot = self.single(path)?;
        Ok(slot.as_ref().filter(|asset| !asset.is_marked_for_deletion()))
    }

    pub fn replace(&mut self, path: &FieldPath, file: LocalFile) -> Result<(), TrackerError> {
        let slot = self.single_mut(path)?;
        *slot = Some(PendingAsset::attach_new_file(slot.as_ref(), file));
        Ok(())
    }

    pub fn remove(&mut self, path: &FieldPath) -> Result<(), TrackerError> {
        let slot = self.single_mut(path)?;
        *slot = slot.as_ref().and_then(PendingAsset::mark_deleted);
        Ok(())
    }

    pub fn set_alt(&mut self, path: &FieldPath, alt: &str) -> Result<(), TrackerError> {
        let asset = self
            .single_mut(path)?
            .as_mut()
            .ok_or_else(|| TrackerError::NoImage(path.clone()))?;
        if asset.is_marked_for_deletion() {
            return Err(TrackerError::Removed(path.clone()));
        }
        asset.alt = alt.to_string();
        Ok(())
    }

    /// Images still shown in a list, with their positions.
    pub fn visible(
        &self,
        path: &FieldPath,
    ) -> Result<impl Iterator<Item = (usize, &PendingAsset)>, TrackerError> {
        let items = self.list(path)?;
        Ok(items.iter().enumerate().filter_map(|(index, item)| {
            item.image()
                .filter(|asset| !asset.is_marked_for_deletion())
                .map(|asset| (index, asset))
        }))
    }

    pub fn push(&mut self, path: &FieldPath, file: LocalFile, alt: &str) -> Result<usize, TrackerError> {
        let items = self.list_mut(path)?.0;
        items.push(ListItem::Image(
            PendingAsset::attach_new_file(None, file).update_alt(alt),
        ));
        Ok(items.len() - 1)
    }

    /// Put `file` at `index`. A position that held no image gets one.
    pub fn replace_at(
        &mut self,
        path: &FieldPath,
        index: usize,
        file: LocalFile,
    ) -> Result<(), TrackerError> {
        let item = self.element_mut(path, index)?;
        let current = match &*item {
            ListItem::Untracked => None,
            ListItem::Image(asset) if !asset.is_marked_for_deletion() => Some(asset),
            _ => return Err(TrackerError::Removed(path.clone().index(index))),
        };
        *item = ListItem::Image(PendingAsset::attach_new_file(current, file));
        Ok(())
    }

    /// Remove the image at `index`. Positions of loaded elements never shift;
    /// an image pushed since load leaves the list outright.
    pub fn remove_at(&mut self, path: &FieldPath, index: usize) -> Result<(), TrackerError> {
        let (items, loaded) = self.list_mut(path)?;
        let len = items.len();
        let item = items.get(index).ok_or_else(|| TrackerError::IndexOutOfRange {
            path: path.clone(),
            index,
            len,
        })?;
        let asset = match item {
            ListItem::Untracked => return Err(TrackerError::NoImage(path.clone().index(index))),
            ListItem::Discarded => return Ok(()),
            ListItem::Image(asset) => asset,
        };
        match asset.mark_deleted() {
            Some(marked) => items[index] = ListItem::Image(marked),
            None if index < loaded => items[index] = ListItem::Discarded,
            None => {
                items.remove(index);
            }
        }
        Ok(())
    }

    pub fn set_alt_at(&mut self, path: &FieldPath, index: usize, alt: &str) -> Result<(), TrackerError> {
        match self.element_mut(path, index)? {
            ListItem::Image(asset) if !asset.is_marked_for_deletion() => {
                asset.alt = alt.to_string();
                Ok(())
            }
            ListItem::Untracked => Err(TrackerError::NoImage(path.clone().index(index))),
            _ => Err(TrackerError::Removed(path.clone().index(index))),
        }
    }

    /// Every public id the next save must delete, deduplicated.
    pub fn deletion_set(&self) -> BTreeSet<String> {
        self.all_assets()
            .filter_map(PendingAsset::pending_deletion)
            .map(str::to_string)
            .collect()
    }

    pub fn pending_uploads(&self) -> usize {
        self.all_assets().filter(|asset| asset.is_new()).count()
    }

    pub fn is_dirty(&self) -> bool {
        self.all_assets().any(|asset| !asset.is_clean())
            || self.fields.iter().any(|field| field.slot.has_discarded())
    }

    fn all_assets(&self) -> impl Iterator<Item = &PendingAsset> {
        self.fields.iter().flat_map(|field| field.slot.assets())
    }

    fn slot(&self, path: &FieldPath) -> Result<&TrackedSlot, TrackerError> {
        self.fields
            .iter()
            .find(|field| &field.path == path)
            .map(|field| &field.slot)
            .ok_or_else(|| TrackerError::UnknownField(path.clone()))
    }

    fn slot_mut(&mut self, path: &FieldPath) -> Result<&mut TrackedSlot, TrackerError> {
        self.fields
            .iter_mut()
            .find(|field| &field.path == path)
            .map(|field| &mut field.slot)
            .ok_or_else(|| TrackerError::UnknownField(path.clone()))
    }

    fn single(&self, path: &FieldPath) -> Result<&Option<PendingAsset>, TrackerError> {
        match self.slot(path)? {
            TrackedSlot::Single(slot) => Ok(slot),
            other => Err(TrackerError::WrongKind {
                path: path.clone(),
                actual: other.kind_name(),
            }),
        }
    }

    fn single_mut(&mut self, path: &FieldPath) -> Result<&mut Option<PendingAsset>, TrackerError> {
        match self.slot_mut(path)? {
            TrackedSlot::Single(slot) => Ok(slot),
            other => Err(TrackerError::WrongKind {
                path: path.clone(),
                actual: other.kind_name(),
            }),
        }
    }

    fn list(&self, path: &FieldPath) -> Result<&Vec<ListItem>, TrackerError> {
        match self.slot(path)? {
            TrackedSlot::List { items, .. } => Ok(items),
            other => Err(TrackerError::WrongKind {
                path: path.clone(),
                actual: other.kind_name(),
            }),
        }
    }

    fn list_mut(&mut self, path: &FieldPath) -> Result<(&mut Vec<ListItem>, usize), TrackerError> {
        match self.slot_mut(path)? {
            TrackedSlot::List { items, loaded } => Ok((items, *loaded)),
            other => Err(TrackerError::WrongKind {
                path: path.clone(),
                actual: other.kind_name(),
            }),
        }
    }

    fn element_mut(&mut self, path: &FieldPath, index: usize) -> Result<&mut ListItem, TrackerError> {
        let items = self.list_mut(path)?.0;
        let len = items.len();
        items.get_mut(index).ok_or_else(|| TrackerError::IndexOutOfRange {
            path: path.clone(),
            index,
            len,
        })
    }
}
