//! Dotted-path access into nested settings documents.
//!
//! # Design
//! - Forward transforms read through [`lookup`]/[`lookup_or`] so a missing
//!   intermediate object never raises; it simply yields an absent leaf.
//! - JSON `null` leaves count as absent, matching how the backend reports unset values.
//! - Reverse transforms write through [`insert`], which creates intermediate
//!   objects and reports a structural error instead of overwriting scalars.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde_json::{Map, Value};

use crate::error::{SettingsError, SettingsResult};

/// Path to a value inside a nested document, e.g. `downloaders.real_debrid.api_key`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentPath {
    segments: Vec<String>,
}

impl DocumentPath {
    /// Build a path from a dotted literal known to be well formed.
    #[must_use]
    pub fn new(dotted: &str) -> Self {
        Self {
            segments: dotted.split('.').map(str::to_string).collect(),
        }
    }

    /// Parse a dotted path supplied at runtime.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::InvalidPath`] when the input is empty or has empty segments.
    pub fn parse(raw: &str) -> SettingsResult<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.split('.').any(str::is_empty) {
            return Err(SettingsError::InvalidPath {
                value: raw.to_string(),
            });
        }
        Ok(Self::new(trimmed))
    }

    /// Path segments from the document root down to the leaf.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Top-level document key this path lives under.
    #[must_use]
    pub fn root(&self) -> &str {
        self.segments.first().map_or("", String::as_str)
    }

    /// Final segment naming the leaf.
    #[must_use]
    pub fn leaf(&self) -> &str {
        self.segments.last().map_or("", String::as_str)
    }
}

impl FromStr for DocumentPath {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Display for DocumentPath {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.segments.join("."))
    }
}

/// Resolve `path` inside `root`, treating missing intermediates and `null` leaves as absent.
#[must_use]
pub fn lookup<'a>(root: &'a Value, path: &DocumentPath) -> Option<&'a Value> {
    let mut current = root;
    for segment in path.segments() {
        current = current.as_object()?.get(segment)?;
    }
    if current.is_null() { None } else { Some(current) }
}

/// Resolve `path` inside `root`, falling back to `default` when the leaf is absent.
#[must_use]
pub fn lookup_or(root: &Value, path: &DocumentPath, default: &Value) -> Value {
    lookup(root, path).unwrap_or(default).clone()
}

/// Write `value` at `path`, creating intermediate objects as needed.
///
/// # Errors
///
/// Returns [`SettingsError::PathConflict`] when an intermediate segment already
/// holds a non-object value.
pub fn insert(target: &mut Map<String, Value>, path: &DocumentPath, value: Value) -> SettingsResult<()> {
    let Some((leaf, parents)) = path.segments().split_last() else {
        return Err(SettingsError::InvalidPath {
            value: path.to_string(),
        });
    };

    let mut current = target;
    for segment in parents {
        let slot = current
            .entry(segment.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        if slot.is_null() {
            *slot = Value::Object(Map::new());
        }
        current = slot
            .as_object_mut()
            .ok_or_else(|| SettingsError::PathConflict {
                path: path.to_string(),
                segment: segment.clone(),
            })?;
    }
    current.insert(leaf.clone(), value);
    Ok(())
}

/// Remove and return the value at `path`, if present.
pub fn remove(target: &mut Map<String, Value>, path: &DocumentPath) -> Option<Value> {
    let (leaf, parents) = path.segments().split_last()?;
    let mut current = target;
    for segment in parents {
        current = current.get_mut(segment)?.as_object_mut()?;
    }
    current.remove(leaf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn lookup_reads_nested_leaves() {
        let doc = json!({"downloaders": {"real_debrid": {"api_key": "abc"}}});
        let path = DocumentPath::new("downloaders.real_debrid.api_key");
        assert_eq!(lookup(&doc, &path), Some(&json!("abc")));
        assert_eq!(path.root(), "downloaders");
        assert_eq!(path.leaf(), "api_key");
    }

    #[test]
    fn lookup_absorbs_missing_and_scalar_intermediates() {
        let path = DocumentPath::new("downloaders.torbox.api_key");
        assert!(lookup(&json!({}), &path).is_none());
        assert!(lookup(&json!({"downloaders": 3}), &path).is_none());
        assert!(lookup(&json!({"downloaders": {"torbox": null}}), &path).is_none());
        assert!(lookup(&json!("not an object"), &path).is_none());
    }

    #[test]
    fn lookup_or_substitutes_default_for_null_leaf() {
        let doc = json!({"updaters": {"plex": {"token": null}}});
        let value = lookup_or(&doc, &DocumentPath::new("updaters.plex.token"), &json!(""));
        assert_eq!(value, json!(""));
    }

    #[test]
    fn insert_builds_intermediate_objects() -> anyhow::Result<()> {
        let mut doc = Map::new();
        insert(&mut doc, &DocumentPath::new("a.b.c"), json!(1))?;
        insert(&mut doc, &DocumentPath::new("a.b.d"), json!(2))?;
        insert(&mut doc, &DocumentPath::new("debug"), json!(true))?;
        assert_eq!(
            Value::Object(doc),
            json!({"a": {"b": {"c": 1, "d": 2}}, "debug": true})
        );
        Ok(())
    }

    #[test]
    fn insert_rejects_scalar_intermediate() {
        let mut doc = Map::new();
        doc.insert("a".into(), json!("scalar"));
        let err = insert(&mut doc, &DocumentPath::new("a.b"), json!(1)).unwrap_err();
        assert!(matches!(err, SettingsError::PathConflict { ref segment, .. } if segment == "a"));
    }

    #[test]
    fn remove_detaches_leaf() {
        let mut doc = json!({"traefik": {"authMethod": "oauth", "oauth_mail": "x"}})
            .as_object()
            .cloned()
            .unwrap_or_default();
        let removed = remove(&mut doc, &DocumentPath::new("traefik.oauth_mail"));
        assert_eq!(removed, Some(json!("x")));
        assert_eq!(Value::Object(doc), json!({"traefik": {"authMethod": "oauth"}}));
    }

    #[test]
    fn parse_rejects_empty_segments() {
        assert!(DocumentPath::parse("").is_err());
        assert!(DocumentPath::parse("a..b").is_err());
        assert_eq!(
            "symlink.rclone_path"
                .parse::<DocumentPath>()
                .map(|path| path.to_string())
                .ok(),
            Some("symlink.rclone_path".to_string())
        );
    }
}
