//! Settings gateway abstraction used by the page controllers.

use std::sync::Arc;

use async_trait::async_trait;
use riven_settings::Patch;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::GatewayResult;

/// Backend answer to a patch application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyOutcome {
    /// Whether the backend accepted and initialised the new settings.
    pub success: bool,
    /// Optional backend message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ApplyOutcome {
    /// Accepted outcome.
    #[must_use]
    pub const fn accepted() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    /// Rejected outcome carrying the backend message.
    #[must_use]
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

/// Remote settings store: fetch fragments, apply patches, persist and reload.
#[async_trait]
pub trait SettingsGateway: Send + Sync {
    /// Fetch the top-level `keys` of the settings document as one object.
    async fn fetch_fragment(&self, keys: &[&str]) -> GatewayResult<Value>;
    /// Apply replace-at-key overwrites.
    async fn apply_patch(&self, patch: &Patch) -> GatewayResult<ApplyOutcome>;
    /// Ask the backend to write its settings durably.
    async fn persist(&self) -> GatewayResult<()>;
    /// Ask the backend to re-read persisted settings into its running configuration.
    async fn reload(&self) -> GatewayResult<()>;
}

/// Shared reference to the settings backend.
pub type SharedGateway = Arc<dyn SettingsGateway>;
