use thiserror::Error;

use super::document::{SectionName, SectionNameError};
use super::path::{FieldPath, PathError};
use super::text_block::BlockTag;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("invalid section: {0}")]
    Section(#[from] SectionNameError),
    #[error("invalid field path {path:?}: {source}")]
    Path {
        path: String,
        #[source]
        source: PathError,
    },
    #[error("field {0} is declared twice")]
    Duplicate(FieldPath),
}

/// How an image field is laid out in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetFieldKind {
    /// One image object at the path.
    Single,
    /// An array of image objects at the path.
    List,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextField {
    pub path: FieldPath,
    pub default_tag: BlockTag,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetField {
    pub path: FieldPath,
    pub kind: AssetFieldKind,
}

/// Declares which fields of a section are text blocks and which are images.
///
/// ```
/// use estate_cms_core::{BlockTag, SectionSchema};
///
/// let schema = SectionSchema::new("about")?
///     .text("introSection.title", BlockTag::H2)?
///     .image("introSection.image")?
///     .image_list("gallery")?;
/// assert_eq!(schema.asset_fields().len(), 2);
/// # Ok::<(), estate_cms_core::content::SchemaError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionSchema {
    section: SectionName,
    text_fields: Vec<TextField>,
    asset_fields: Vec<AssetField>,
}

impl SectionSchema {
    pub fn new(section: &str) -> Result<Self, SchemaError> {
        Ok(Self::for_section(SectionName::parse(section)?))
    }

    pub fn for_section(section: SectionName) -> Self {
        Self {
            section,
            text_fields: Vec::new(),
            asset_fields: Vec::new(),
        }
    }

    pub fn text(mut self, path: &str, default_tag: BlockTag) -> Result<Self, SchemaError> {
        let path = self.fresh_path(path)?;
        self.text_fields.push(TextField { path, default_tag });
        Ok(self)
    }

    pub fn image(self, path: &str) -> Result<Self, SchemaError> {
        self.asset(path, AssetFieldKind::Single)
    }

    pub fn image_list(self, path: &str) -> Result<Self, SchemaError> {
        self.asset(path, AssetFieldKind::List)
    }

    fn asset(mut self, path: &str, kind: AssetFieldKind) -> Result<Self, SchemaError> {
        let path = self.fresh_path(path)?;
        self.asset_fields.push(AssetField { path, kind });
        Ok(self)
    }

    fn fresh_path(&self, raw: &str) -> Result<FieldPath, SchemaError> {
        let path = FieldPath::parse(raw).map_err(|source| SchemaError::Path {
            path: raw.to_string(),
            source,
        })?;
        let taken = self.text_fields.iter().any(|f| f.path == path)
            || self.asset_fields.iter().any(|f| f.path == path);
        if taken {
            return Err(SchemaError::Duplicate(path));
        }
        Ok(path)
    }

    pub fn section(&self) -> &SectionName {
        &self.section
    }

    pub fn text_fields(&self) -> &[TextField] {
        &self.text_fields
    }

    pub fn asset_fields(&self) -> &[AssetField] {
        &self.asset_fields
    }

    pub fn text_field(&self, path: &FieldPath) -> Option<&TextField> {
        self.text_fields.iter().find(|f| &f.path == path)
    }
}
