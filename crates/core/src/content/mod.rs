pub mod document;
pub mod path;
pub mod schema;
pub mod text_block;

pub use document::{ContentDocument, SectionName, SectionNameError};
pub use path::{FieldPath, PathError, PathStep};
pub use schema::{AssetField, AssetFieldKind, SchemaError, SectionSchema, TextField};
pub use text_block::{normalize, BlockTag, TextBlock, UnknownTag};
