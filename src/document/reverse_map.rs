use crate::document::flatten::flatten;
use crate::error::{CaptureError, Result};
use crate::host::ReferenceSource;
use crate::phase::Phase;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Prefix marking a flat path as a placeholder
pub const PLACEHOLDER_SIGIL: char = '$';

/// Symbolic stand-in for the value found at a flat path (`$path`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaceholderToken(String);

impl PlaceholderToken {
    pub fn for_path(path: &str) -> Self {
        Self(format!("{}{}", PLACEHOLDER_SIGIL, path))
    }

    /// Flat path behind the sigil, `None` for malformed tokens
    pub fn path(&self) -> Option<&str> {
        self.0.strip_prefix(PLACEHOLDER_SIGIL).filter(|path| !path.is_empty())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlaceholderToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Placeholders recorded for one concrete value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueEntry {
    /// Typed scalar as first seen (string for values observed in inputs)
    pub value: Value,

    pub placeholders: Vec<PlaceholderToken>,
}

/// Concrete value text to the placeholders that produce it.
///
/// Keys keep insertion order and each placeholder list is unique and ordered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReverseValueMap {
    entries: IndexMap<String, ValueEntry>,
}

/// Text under which a scalar is indexed; `None` for nulls and containers
pub fn scalar_key(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

impl ReverseValueMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index every scalar leaf of a reference document
    pub fn from_document(doc: &Value) -> Self {
        let mut map = Self::new();
        for (path, value) in flatten(doc) {
            map.insert(&value, PlaceholderToken::for_path(&path));
        }
        map
    }

    /// Load the reference document for `phase` and index it
    pub async fn build(phase: &str, references: &dyn ReferenceSource) -> Result<Self> {
        let phase: Phase = phase.parse()?;
        let file = phase.reference_file();
        let doc = references.load(file).await.map_err(|e| match e {
            CaptureError::ReferenceLoad { .. } => e,
            other => CaptureError::ReferenceLoad {
                file: file.to_string(),
                reason: other.to_string(),
            },
        })?;
        Ok(Self::from_document(&doc))
    }

    /// Append `token` under the value's text; returns false for duplicates and non-scalars
    pub fn insert(&mut self, value: &Value, token: PlaceholderToken) -> bool {
        let Some(key) = scalar_key(value) else {
            return false;
        };
        let entry = self.entries.entry(key).or_insert_with(|| ValueEntry {
            value: value.clone(),
            placeholders: Vec::new(),
        });
        if entry.placeholders.contains(&token) {
            return false;
        }
        entry.placeholders.push(token);
        true
    }

    /// First placeholder recorded for a value
    pub fn lookup(&self, text: &str) -> Option<&PlaceholderToken> {
        self.entries.get(text).and_then(|entry| entry.placeholders.first())
    }

    pub fn placeholders(&self, text: &str) -> Option<&[PlaceholderToken]> {
        self.entries.get(text).map(|entry| entry.placeholders.as_slice())
    }

    /// Resolve a value observed in an input, creating `$<field>` from `infer_field`
    /// when the value is new. Returns the token and whether the map changed.
    pub fn resolve_or_insert(
        &mut self,
        text: &str,
        infer_field: impl FnOnce() -> String,
    ) -> (PlaceholderToken, bool) {
        if let Some(existing) = self.lookup(text) {
            return (existing.clone(), false);
        }
        let token = PlaceholderToken::for_path(&infer_field());
        self.insert(&Value::String(text.to_string()), token.clone());
        (token, true)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ValueEntry)> {
        self.entries.iter()
    }

    pub fn contains(&self, text: &str) -> bool {
        self.entries.contains_key(text)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
