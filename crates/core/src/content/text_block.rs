use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Block kinds an editor can pick for a piece of copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockTag {
    #[default]
    P,
    H1,
    H2,
    H3,
    H4,
    H5,
    H6,
    Span,
}

impl BlockTag {
    pub const ALL: [BlockTag; 8] = [
        BlockTag::P,
        BlockTag::H1,
        BlockTag::H2,
        BlockTag::H3,
        BlockTag::H4,
        BlockTag::H5,
        BlockTag::H6,
        BlockTag::Span,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BlockTag::P => "p",
            BlockTag::H1 => "h1",
            BlockTag::H2 => "h2",
            BlockTag::H3 => "h3",
            BlockTag::H4 => "h4",
            BlockTag::H5 => "h5",
            BlockTag::H6 => "h6",
            BlockTag::Span => "span",
        }
    }

    pub fn is_heading(&self) -> bool {
        !matches!(self, BlockTag::P | BlockTag::Span)
    }
}

impl fmt::Display for BlockTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown block tag: {0:?}")]
pub struct UnknownTag(pub String);

impl FromStr for BlockTag {
    type Err = UnknownTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        BlockTag::ALL
            .into_iter()
            .find(|tag| tag.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownTag(s.to_string()))
    }
}

/// A styled piece of copy: the text plus the block kind it renders as.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TextBlock {
    pub tag: BlockTag,
    pub text: String,
}

impl TextBlock {
    pub fn new(tag: BlockTag, text: impl Into<String>) -> Self {
        Self {
            tag,
            text: text.into(),
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::json!({ "tag": self.tag, "text": self.text })
    }
}

/// Coerce whatever a document holds at a text field into a [`TextBlock`].
///
/// Older documents stored bare strings, newer ones `{tag, text}` objects.
/// Never fails: anything unusable falls back to `default_tag` and empty text.
pub fn normalize(value: Option<&Value>, default_tag: BlockTag) -> TextBlock {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => TextBlock::new(default_tag, ""),
        Some(Value::String(text)) => TextBlock::new(default_tag, text.as_str()),
        Some(Value::Object(map)) => {
            let tag = map
                .get("tag")
                .and_then(Value::as_str)
                .and_then(|raw| raw.parse().ok())
                .unwrap_or(default_tag);
            let text = map.get("text").and_then(Value::as_str).unwrap_or_default();
            TextBlock::new(tag, text)
        }
        Some(_) => TextBlock::new(default_tag, ""),
    }
}
