//! In-process settings gateway.
//!
//! Holds a working document and a persisted copy, mirroring how the backend
//! separates running configuration from what `save` writes to disk.

use async_trait::async_trait;
use riven_settings::Patch;
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{GatewayError, GatewayResult};
use crate::gateway::{ApplyOutcome, SettingsGateway};

/// Message the backend answers with when a patch is accepted.
const ACCEPTED_MESSAGE: &str = "Settings updated successfully.";

#[derive(Debug, Default)]
struct MemoryState {
    document: Map<String, Value>,
    persisted: Map<String, Value>,
    persist_calls: usize,
    reload_calls: usize,
    rejection: Option<String>,
    unavailable: bool,
}

/// Gateway backed by a document held in memory.
#[derive(Debug, Default)]
pub struct MemoryGateway {
    state: Mutex<MemoryState>,
}

impl MemoryGateway {
    /// Empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from `document`, treated as both running and persisted.
    ///
    /// Non-object values start an empty document.
    #[must_use]
    pub fn with_document(document: Value) -> Self {
        let document = match document {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            state: Mutex::new(MemoryState {
                persisted: document.clone(),
                document,
                ..MemoryState::default()
            }),
        }
    }

    /// Answer subsequent patches with a rejection carrying `message`.
    pub async fn reject_patches(&self, message: impl Into<String>) {
        self.state.lock().await.rejection = Some(message.into());
    }

    /// Fail every call as if the backend were down.
    pub async fn set_unavailable(&self, unavailable: bool) {
        self.state.lock().await.unavailable = unavailable;
    }

    /// Current running document.
    pub async fn document(&self) -> Value {
        Value::Object(self.state.lock().await.document.clone())
    }

    /// Last persisted document.
    pub async fn persisted(&self) -> Value {
        Value::Object(self.state.lock().await.persisted.clone())
    }

    /// Number of `persist` calls served.
    pub async fn persist_calls(&self) -> usize {
        self.state.lock().await.persist_calls
    }

    /// Number of `reload` calls served.
    pub async fn reload_calls(&self) -> usize {
        self.state.lock().await.reload_calls
    }
}

fn ensure_online(state: &MemoryState, operation: &'static str) -> GatewayResult<()> {
    if state.unavailable {
        Err(GatewayError::Offline { operation })
    } else {
        Ok(())
    }
}

#[async_trait]
impl SettingsGateway for MemoryGateway {
    async fn fetch_fragment(&self, keys: &[&str]) -> GatewayResult<Value> {
        let state = self.state.lock().await;
        ensure_online(&state, "fetch_fragment")?;
        let fragment: Map<String, Value> = keys
            .iter()
            .filter_map(|key| {
                state
                    .document
                    .get(*key)
                    .map(|value| ((*key).to_string(), value.clone()))
            })
            .collect();
        Ok(Value::Object(fragment))
    }

    async fn apply_patch(&self, patch: &Patch) -> GatewayResult<ApplyOutcome> {
        let mut state = self.state.lock().await;
        ensure_online(&state, "apply_patch")?;
        if let Some(message) = state.rejection.clone() {
            return Ok(ApplyOutcome::rejected(message));
        }
        patch.apply_to(&mut state.document);
        debug!(keys = patch.len(), "applied patch in memory");
        Ok(ApplyOutcome {
            success: true,
            message: Some(ACCEPTED_MESSAGE.to_string()),
        })
    }

    async fn persist(&self) -> GatewayResult<()> {
        let mut state = self.state.lock().await;
        ensure_online(&state, "persist")?;
        state.persisted = state.document.clone();
        state.persist_calls += 1;
        Ok(())
    }

    async fn reload(&self) -> GatewayResult<()> {
        let mut state = self.state.lock().await;
        ensure_online(&state, "reload")?;
        state.document = state.persisted.clone();
        state.reload_calls += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn fetch_returns_only_present_keys() -> anyhow::Result<()> {
        let gateway = MemoryGateway::with_document(json!({"media": {"enabled": true}, "debug": false}));
        let fragment = gateway.fetch_fragment(&["media", "symlink"]).await?;
        assert_eq!(fragment, json!({"media": {"enabled": true}}));
        Ok(())
    }

    #[tokio::test]
    async fn reload_discards_unpersisted_changes() -> anyhow::Result<()> {
        let gateway = MemoryGateway::with_document(json!({"debug": true}));
        let mut patch = Patch::new();
        patch.push("debug", json!(false));
        assert!(gateway.apply_patch(&patch).await?.success);
        gateway.reload().await?;
        assert_eq!(gateway.document().await, json!({"debug": true}));

        gateway.apply_patch(&patch).await?;
        gateway.persist().await?;
        gateway.reload().await?;
        assert_eq!(gateway.document().await, json!({"debug": false}));
        assert_eq!(gateway.persist_calls().await, 1);
        assert_eq!(gateway.reload_calls().await, 2);
        Ok(())
    }

    #[tokio::test]
    async fn rejection_leaves_document_untouched() -> anyhow::Result<()> {
        let gateway = MemoryGateway::with_document(json!({"debug": true}));
        gateway.reject_patches("bad settings").await;
        let mut patch = Patch::new();
        patch.push("debug", json!(false));
        let outcome = gateway.apply_patch(&patch).await?;
        assert_eq!(outcome, ApplyOutcome::rejected("bad settings"));
        assert_eq!(gateway.document().await, json!({"debug": true}));
        Ok(())
    }

    #[tokio::test]
    async fn unavailable_gateway_fails_every_call() {
        let gateway = MemoryGateway::new();
        gateway.set_unavailable(true).await;
        assert!(matches!(
            gateway.fetch_fragment(&["debug"]).await,
            Err(GatewayError::Offline {
                operation: "fetch_fragment"
            })
        ));
        assert!(gateway.persist().await.is_err());
    }
}
