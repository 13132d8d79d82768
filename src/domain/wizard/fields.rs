//! Form field map owned by one wizard instance.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Field name to raw input value.
///
/// Missing fields read as the empty string, matching an untouched input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormFields(BTreeMap<String, String>);

impl FormFields {
    /// Creates an empty field map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    /// Sets a field, replacing any previous value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    /// Removes a field.
    pub fn clear(&mut self, name: &str) {
        self.0.remove(name);
    }

    /// Raw value, or `""` when the field was never set.
    pub fn get(&self, name: &str) -> &str {
        self.0.get(name).map(String::as_str).unwrap_or("")
    }

    /// Value with surrounding whitespace removed.
    pub fn trimmed(&self, name: &str) -> &str {
        self.get(name).trim()
    }

    /// Returns true if the field is missing or whitespace only.
    pub fn is_blank(&self, name: &str) -> bool {
        self.trimmed(name).is_empty()
    }

    /// Parses the trimmed value, `None` when blank or unparsable.
    pub fn parse<T: FromStr>(&self, name: &str) -> Option<T> {
        let value = self.trimmed(name);
        if value.is_empty() {
            return None;
        }
        value.parse().ok()
    }

    /// Interprets checkbox-style values.
    pub fn flag(&self, name: &str) -> bool {
        matches!(self.trimmed(name), "true" | "on" | "yes" | "1")
    }

    /// Merges another map into this one, overwriting on conflict.
    pub fn merge(&mut self, other: FormFields) {
        self.0.extend(other.0);
    }

    /// Iterates fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
