//! # Design
//!
//! - Constant error messages; context lives in structured fields.
//! - [`PageError`] messages are the texts shown to the person editing settings.
//! - Gateway and mirror failures keep their source errors.

use std::io;
use std::path::PathBuf;

use riven_settings::{SettingsError, ValidationErrors};
use thiserror::Error;

/// Result type for gateway calls.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Result type for mirror file operations.
pub type MirrorResult<T> = Result<T, MirrorError>;

/// Result type for page controller operations.
pub type PageResult<T> = Result<T, PageError>;

/// Failures talking to the settings backend.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The request never produced a response.
    #[error("settings backend unreachable")]
    Transport {
        /// Gateway operation that failed.
        operation: &'static str,
        /// Underlying HTTP client error.
        source: reqwest::Error,
    },
    /// The backend answered with a non-success status.
    #[error("settings backend returned an error status")]
    Status {
        /// Gateway operation that failed.
        operation: &'static str,
        /// HTTP status code.
        status: u16,
    },
    /// The response body did not match the expected envelope.
    #[error("settings backend response was malformed")]
    Decode {
        /// Gateway operation that failed.
        operation: &'static str,
        /// Underlying HTTP client error.
        source: reqwest::Error,
    },
    /// The backend envelope reported failure.
    #[error("settings backend reported a failure")]
    Backend {
        /// Gateway operation that failed.
        operation: &'static str,
        /// Message supplied by the backend, if any.
        message: Option<String>,
    },
    /// The configured backend URL cannot be used.
    #[error("invalid settings backend url")]
    InvalidUrl {
        /// Offending URL text.
        value: String,
        /// Underlying parse error.
        source: url::ParseError,
    },
    /// The request id cannot be sent as a header value.
    #[error("invalid request id")]
    InvalidRequestId {
        /// Offending request id.
        value: String,
    },
    /// The HTTP client could not be constructed.
    #[error("failed to build settings http client")]
    Client {
        /// Underlying HTTP client error.
        source: reqwest::Error,
    },
    /// The in-memory gateway was told to behave as if the backend were down.
    #[error("settings backend offline")]
    Offline {
        /// Gateway operation that failed.
        operation: &'static str,
    },
}

/// Failures reading or writing the local mirror files.
#[derive(Debug, Error)]
pub enum MirrorError {
    /// Filesystem failure.
    #[error("settings mirror io failure")]
    Io {
        /// Mirror operation that failed.
        operation: &'static str,
        /// File involved.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// JSON encoding failure.
    #[error("settings mirror json failure")]
    Json {
        /// Mirror operation that failed.
        operation: &'static str,
        /// File involved.
        path: PathBuf,
        /// Underlying serde error.
        source: serde_json::Error,
    },
}

/// Outcome of a failed page load or submission.
#[derive(Debug, Error)]
pub enum PageError {
    /// The backend could not be reached while loading.
    #[error("Unable to fetch settings data. API is down.")]
    Unavailable {
        /// Underlying gateway failure.
        source: GatewayError,
    },
    /// Submitted fields violate the group schema.
    #[error("Settings form is invalid.")]
    Validation(#[from] ValidationErrors),
    /// The backend refused the patch.
    #[error("Service(s) failed to initialize. Please check your settings.")]
    Rejected {
        /// Message supplied by the backend, if any.
        message: Option<String>,
    },
    /// Applying, persisting or reloading failed in transit.
    #[error("Unable to save settings. API is down.")]
    SaveFailed {
        /// Underlying gateway failure.
        source: GatewayError,
    },
    /// The applications mirror could not be read or written.
    #[error("Unable to update the local settings mirror.")]
    Mirror(#[from] MirrorError),
    /// The reverse transform hit a structural problem.
    #[error("Settings could not be converted for the backend.")]
    Settings {
        /// Underlying transform error.
        source: SettingsError,
    },
}

impl From<SettingsError> for PageError {
    fn from(error: SettingsError) -> Self {
        match error {
            SettingsError::Validation(errors) => Self::Validation(errors),
            source => Self::Settings { source },
        }
    }
}

impl PageError {
    /// HTTP-style status a web surface would answer with.
    #[must_use]
    pub const fn status(&self) -> u16 {
        match self {
            Self::Unavailable { .. } => 503,
            Self::Validation(_) | Self::Rejected { .. } | Self::SaveFailed { .. } => 400,
            Self::Mirror(_) | Self::Settings { .. } => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use riven_settings::GroupId;

    #[test]
    fn user_facing_messages_are_constant() {
        let unavailable = PageError::Unavailable {
            source: GatewayError::Offline { operation: "fetch" },
        };
        assert_eq!(
            unavailable.to_string(),
            "Unable to fetch settings data. API is down."
        );
        assert_eq!(unavailable.status(), 503);
        let rejected = PageError::Rejected {
            message: Some("bad key".to_string()),
        };
        assert_eq!(
            rejected.to_string(),
            "Service(s) failed to initialize. Please check your settings."
        );
        let save = PageError::SaveFailed {
            source: GatewayError::Status {
                operation: "persist",
                status: 502,
            },
        };
        assert_eq!(save.to_string(), "Unable to save settings. API is down.");
    }

    #[test]
    fn settings_errors_split_validation_from_structure() {
        let mut errors = ValidationErrors::new();
        errors.push("label", "Required");
        assert!(matches!(
            PageError::from(SettingsError::Validation(errors)),
            PageError::Validation(_)
        ));
        let structural = PageError::from(SettingsError::MissingField {
            group: GroupId::Zurg,
            field: "rclone_path".to_string(),
        });
        assert!(matches!(structural, PageError::Settings { .. }));
        assert_eq!(structural.status(), 500);
    }
}
