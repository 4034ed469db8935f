use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Section name validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SectionNameError {
    #[error("section name cannot be empty")]
    Empty,
    #[error("section name {name:?} contains invalid character {ch:?}")]
    InvalidChar { name: String, ch: char },
}

/// Key of one content document in the Document Store (`about`, `pricing`, ...).
///
/// Becomes a URL path segment, so only ASCII letters, digits, `-` and `_`
/// are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SectionName(String);

impl SectionName {
    pub fn parse(name: &str) -> Result<Self, SectionNameError> {
        if name.is_empty() {
            return Err(SectionNameError::Empty);
        }
        if let Some(ch) = name
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
        {
            return Err(SectionNameError::InvalidChar {
                name: name.to_string(),
                ch,
            });
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for SectionName {
    type Error = SectionNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        SectionName::parse(&value)
    }
}

impl From<SectionName> for String {
    fn from(value: SectionName) -> Self {
        value.0
    }
}

/// A section's JSON document. Shape is section-specific.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentDocument {
    pub section: SectionName,
    pub body: Value,
}

impl ContentDocument {
    pub fn new(section: SectionName, body: Value) -> Self {
        Self { section, body }
    }
}
