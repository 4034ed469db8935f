//! Typed paths into content documents.
//!
//! A path is written the way admin forms address fields:
//! `introSection.image`, `gallery[2].caption`, `[0].title`.
//! Updates happen in place on the working copy.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathStep {
    Key(String),
    Index(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("field path is empty")]
    Empty,
    #[error("empty segment at byte {0}")]
    EmptySegment(usize),
    #[error("invalid index {0:?}")]
    InvalidIndex(String),
    #[error("unterminated index at byte {0}")]
    Unterminated(usize),
    #[error("unexpected character {ch:?} at byte {at}")]
    UnexpectedChar { ch: char, at: usize },
    #[error("{path}: expected {expected}, found {found}")]
    TypeMismatch {
        path: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("{path}: index {index} out of range (len {len})")]
    IndexOutOfRange {
        path: String,
        index: usize,
        len: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct FieldPath {
    steps: Vec<PathStep>,
}

impl FieldPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn parse(input: &str) -> Result<Self, PathError> {
        if input.is_empty() {
            return Err(PathError::Empty);
        }

        let bytes = input.as_bytes();
        let mut steps = Vec::new();
        let mut pos = 0;
        // True right after a '.', where a key is mandatory.
        let mut need_key = false;

        while pos < bytes.len() {
            match bytes[pos] {
                b'[' => {
                    if need_key {
                        return Err(PathError::EmptySegment(pos));
                    }
                    let close = input[pos..]
                        .find(']')
                        .map(|off| pos + off)
                        .ok_or(PathError::Unterminated(pos))?;
                    let raw = &input[pos + 1..close];
                    let index = raw
                        .parse::<usize>()
                        .map_err(|_| PathError::InvalidIndex(raw.to_string()))?;
                    steps.push(PathStep::Index(index));
                    pos = close + 1;
                }
                b'.' => {
                    if steps.is_empty() || need_key {
                        return Err(PathError::EmptySegment(pos));
                    }
                    need_key = true;
                    pos += 1;
                }
                b']' => {
                    return Err(PathError::UnexpectedChar { ch: ']', at: pos });
                }
                _ => {
                    if !steps.is_empty() && !need_key {
                        // A key directly after `[n]` without a dot.
                        let ch = input[pos..].chars().next().unwrap_or_default();
                        return Err(PathError::UnexpectedChar { ch, at: pos });
                    }
                    let end = input[pos..]
                        .find(|c: char| matches!(c, '.' | '[' | ']'))
                        .map_or(input.len(), |off| pos + off);
                    steps.push(PathStep::Key(input[pos..end].to_string()));
                    need_key = false;
                    pos = end;
                }
            }
        }

        if need_key {
            return Err(PathError::EmptySegment(input.len()));
        }
        Ok(Self { steps })
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    pub fn is_root(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.steps.push(PathStep::Key(key.into()));
        self
    }

    pub fn index(mut self, index: usize) -> Self {
        self.steps.push(PathStep::Index(index));
        self
    }

    pub fn get<'a>(&self, value: &'a Value) -> Option<&'a Value> {
        self.steps.iter().try_fold(value, |current, step| match step {
            PathStep::Key(key) => current.as_object()?.get(key),
            PathStep::Index(index) => current.as_array()?.get(*index),
        })
    }

    pub fn get_mut<'a>(&self, value: &'a mut Value) -> Option<&'a mut Value> {
        self.steps
            .iter()
            .try_fold(value, |current, step| match step {
                PathStep::Key(key) => current.as_object_mut()?.get_mut(key),
                PathStep::Index(index) => current.as_array_mut()?.get_mut(*index),
            })
    }

    /// Write `new_value` at this path, creating missing objects along the way.
    ///
    /// `null` on the way is replaced by an object or array as the next step
    /// requires. An index may address an existing element or one past the end
    /// (append); anything further is an error.
    pub fn set(&self, root: &mut Value, new_value: Value) -> Result<(), PathError> {
        let slot = self.slot_mut(root)?;
        *slot = new_value;
        Ok(())
    }

    /// Apply `f` to the value at this path, creating it as `null` first if missing.
    pub fn update<F>(&self, root: &mut Value, f: F) -> Result<(), PathError>
    where
        F: FnOnce(&mut Value),
    {
        f(self.slot_mut(root)?);
        Ok(())
    }

    pub fn remove(&self, root: &mut Value) -> Option<Value> {
        let (last, parent_steps) = self.steps.split_last()?;
        let parent = FieldPath {
            steps: parent_steps.to_vec(),
        }
        .get_mut(root)?;
        match (last, parent) {
            (PathStep::Key(key), Value::Object(map)) => map.remove(key),
            (PathStep::Index(index), Value::Array(items)) if *index < items.len() => {
                Some(items.remove(*index))
            }
            _ => None,
        }
    }

    fn slot_mut<'a>(&self, root: &'a mut Value) -> Result<&'a mut Value, PathError> {
        let mut current = root;
        for (depth, step) in self.steps.iter().enumerate() {
            match step {
                PathStep::Key(key) => {
                    if current.is_null() {
                        *current = Value::Object(Map::new());
                    }
                    let found = kind_of(current);
                    let map = current.as_object_mut().ok_or_else(|| PathError::TypeMismatch {
                        path: self.prefix(depth),
                        expected: "object",
                        found,
                    })?;
                    current = map.entry(key.clone()).or_insert(Value::Null);
                }
                PathStep::Index(index) => {
                    if current.is_null() {
                        *current = Value::Array(Vec::new());
                    }
                    let found = kind_of(current);
                    let items = current.as_array_mut().ok_or_else(|| PathError::TypeMismatch {
                        path: self.prefix(depth),
                        expected: "array",
                        found,
                    })?;
                    let len = items.len();
                    if *index == len {
                        items.push(Value::Null);
                    } else if *index > len {
                        return Err(PathError::IndexOutOfRange {
                            path: self.prefix(depth),
                            index: *index,
                            len,
                        });
                    }
                    current = &mut items[*index];
                }
            }
        }
        Ok(current)
    }

    fn prefix(&self, depth: usize) -> String {
        FieldPath {
            steps: self.steps[..depth].to_vec(),
        }
        .to_string()
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            match step {
                PathStep::Key(key) if i == 0 => f.write_str(key)?,
                PathStep::Key(key) => write!(f, ".{key}")?,
                PathStep::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

impl FromStr for FieldPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldPath::parse(s)
    }
}

impl Serialize for FieldPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FieldPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        FieldPath::parse(&raw).map_err(serde::de::Error::custom)
    }
}
