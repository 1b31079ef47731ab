//! Parameter blobs: `key1=value1;key2=value2`.
//!
//! The delimiter defaults to `;`. When the first character of a blob is one
//! of the configured valid delimiters it overrides the delimiter for that
//! blob only (`|a=1|b=x;y` splits on `|`).

use serde::{Deserialize, Serialize};

/// Default pair delimiter.
pub const DEFAULT_DELIMITER: char = ';';

/// Characters that may lead a blob to override its delimiter.
pub const DEFAULT_VALID_DELIMITERS: &str = ";|,^~";

/// Separator between a key and its value.
pub const KEY_VALUE_SEPARATOR: char = '=';

/// Errors that make a parameter blob unusable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParamError {
    #[error("parameter '{0}' is missing '='")]
    MissingSeparator(String),

    #[error("parameter '{0}' has a blank name")]
    BlankKey(String),

    #[error("duplicate parameter '{0}'")]
    DuplicateKey(String),
}

/// How a blob is split.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamSyntax {
    pub delimiter: char,
    pub valid_delimiters: String,
}

impl Default for ParamSyntax {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER,
            valid_delimiters: DEFAULT_VALID_DELIMITERS.to_string(),
        }
    }
}

impl ParamSyntax {
    /// Resolve the delimiter for one blob and return the remaining text.
    fn split_leading<'a>(&self, blob: &'a str) -> (char, &'a str) {
        match blob.chars().next() {
            Some(c) if self.valid_delimiters.contains(c) => (c, &blob[c.len_utf8()..]),
            _ => (self.delimiter, blob),
        }
    }
}

/// Parsed parameters: lower-cased keys in blob order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Parameters {
    entries: Vec<(String, String)>,
}

impl Parameters {
    /// Parse a blob. Values are kept verbatim; keys are trimmed and
    /// lower-cased. Empty segments are ignored.
    pub fn parse(blob: &str, syntax: &ParamSyntax) -> Result<Self, ParamError> {
        let (delimiter, body) = syntax.split_leading(blob.trim_start());
        let mut params = Self::default();
        for segment in body.split(delimiter) {
            if segment.trim().is_empty() {
                continue;
            }
            let (key, value) = segment
                .split_once(KEY_VALUE_SEPARATOR)
                .ok_or_else(|| ParamError::MissingSeparator(segment.trim().to_string()))?;
            let key = key.trim().to_ascii_lowercase();
            if key.is_empty() {
                return Err(ParamError::BlankKey(segment.trim().to_string()));
            }
            if params.contains(&key) {
                return Err(ParamError::DuplicateKey(key));
            }
            params.entries.push((key, value.to_string()));
        }
        Ok(params)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Value for `key`, or `default` when absent.
    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Insert or replace a value, keeping the original position.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let key = key.trim().to_ascii_lowercase();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Apply `f` to every value in place.
    pub fn map_values(&mut self, mut f: impl FnMut(&str, &str) -> String) {
        for (k, v) in &mut self.entries {
            *v = f(k, v);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
