//! Error types for settings transforms and field validation.

use std::fmt::{self, Display, Formatter};

use serde::Serialize;
use thiserror::Error;

use crate::group::GroupId;

/// Primary error type for settings operations.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Form input failed schema validation.
    #[error("settings validation failed")]
    Validation(#[from] ValidationErrors),
    /// A field bound to a document path was absent from the form record.
    #[error("bound form field missing")]
    MissingField {
        /// Group whose reverse transform was running.
        group: GroupId,
        /// Dotted form field name.
        field: String,
    },
    /// A non-object value sits where a nested object is required.
    #[error("document path blocked by non-object value")]
    PathConflict {
        /// Full dotted path being written.
        path: String,
        /// Segment that held the conflicting value.
        segment: String,
    },
    /// Dotted path string was malformed.
    #[error("invalid document path")]
    InvalidPath {
        /// Raw path provided by the caller.
        value: String,
    },
    /// Settings group identifier was not recognised.
    #[error("unknown settings group")]
    UnknownGroup {
        /// Group identifier provided by the caller.
        value: String,
    },
}

/// Convenience alias for settings results.
pub type SettingsResult<T> = Result<T, SettingsError>;

/// A single field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Dotted form field name (nested fields use `parent.child`, list items `list.0`).
    pub field: String,
    /// Human-readable message shown next to the field.
    pub message: String,
}

/// Every field-level failure collected during one validation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    /// Create an empty error collection.
    #[must_use]
    pub const fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Record a failure for `field`.
    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Whether no failures were recorded.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of failing fields.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.errors.len()
    }

    /// Iterate the recorded failures in schema order.
    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    /// First message recorded for `field`, if any.
    #[must_use]
    pub fn message_for(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|error| error.field == field)
            .map(|error| error.message.as_str())
    }

    pub(crate) fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

impl Display for ValidationErrors {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(formatter, "{} field(s) failed validation", self.errors.len())
    }
}

impl std::error::Error for ValidationErrors {}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a FieldError;
    type IntoIter = std::slice::Iter<'a, FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}
