//! Ordered top-level overwrites sent back to the settings backend.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One replace-at-key overwrite of the settings document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchEntry {
    /// Top-level settings document key.
    pub key: String,
    /// Full nested value that replaces whatever is stored under `key`.
    pub value: Value,
}

/// Ordered sequence of [`PatchEntry`] values, serialised as a JSON array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Patch {
    entries: Vec<PatchEntry>,
}

impl Patch {
    /// Create an empty patch.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append an overwrite for `key`.
    pub fn push(&mut self, key: impl Into<String>, value: Value) {
        self.entries.push(PatchEntry {
            key: key.into(),
            value,
        });
    }

    /// Value written for `key`, if the patch touches it.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|entry| entry.key == key)
            .map(|entry| &entry.value)
    }

    /// Mutable access to the value written for `key`.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.entries
            .iter_mut()
            .find(|entry| entry.key == key)
            .map(|entry| &mut entry.value)
    }

    /// Keys in write order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.key.as_str())
    }

    /// Entries in write order.
    pub fn iter(&self) -> impl Iterator<Item = &PatchEntry> {
        self.entries.iter()
    }

    /// Number of top-level keys overwritten.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the patch writes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reassemble the document fragment this patch would produce on an empty document.
    #[must_use]
    pub fn into_fragment(self) -> Value {
        let mut fragment = Map::new();
        for entry in self.entries {
            fragment.insert(entry.key, entry.value);
        }
        Value::Object(fragment)
    }

    /// Apply the patch onto `document` with replace-at-key semantics.
    pub fn apply_to(&self, document: &mut Map<String, Value>) {
        for entry in &self.entries {
            document.insert(entry.key.clone(), entry.value.clone());
        }
    }
}

impl IntoIterator for Patch {
    type Item = PatchEntry;
    type IntoIter = std::vec::IntoIter<PatchEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl FromIterator<PatchEntry> for Patch {
    fn from_iter<I: IntoIterator<Item = PatchEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
