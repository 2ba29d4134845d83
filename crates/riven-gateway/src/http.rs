//! REST gateway for the Riven backend settings endpoints.
//!
//! # Design
//! - `GET {base}/settings/get/{k1,k2}` answers `{success, message?, data}`.
//! - `POST {base}/settings/set` takes the patch array; `save` and `load` take no body.
//! - No retries. Timeouts come from [`GatewayConfig`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, Response};
use riven_settings::Patch;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{GatewayError, GatewayResult};
use crate::gateway::{ApplyOutcome, SettingsGateway};

/// Backend address used when nothing is configured.
pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8080";

/// Request timeout used when nothing is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const HEADER_REQUEST_ID: &str = "x-request-id";

/// Connection settings for [`HttpSettingsGateway`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Backend root; endpoint paths are appended to it.
    pub base_url: Url,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Identifier sent as `x-request-id` on every call.
    pub request_id: Option<String>,
}

impl GatewayConfig {
    /// Configuration for `base_url` with the default timeout.
    #[must_use]
    pub const fn new(base_url: Url) -> Self {
        Self {
            base_url,
            timeout: DEFAULT_TIMEOUT,
            request_id: None,
        }
    }

    /// Parse `raw` as the backend root.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidUrl`] when `raw` is not an absolute URL.
    pub fn parse(raw: &str) -> GatewayResult<Self> {
        let base_url = raw.parse::<Url>().map_err(|source| GatewayError::InvalidUrl {
            value: raw.to_string(),
            source,
        })?;
        Ok(Self::new(base_url))
    }

    /// Replace the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Attach a request identifier.
    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }
}

/// Gateway backed by the backend REST API.
#[derive(Debug, Clone)]
pub struct HttpSettingsGateway {
    client: Client,
    base_url: Url,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<Value>,
}

impl HttpSettingsGateway {
    /// Build a gateway and its HTTP client.
    ///
    /// # Errors
    ///
    /// Returns an error when the request id is not a valid header value or the
    /// client cannot be constructed.
    pub fn new(config: &GatewayConfig) -> GatewayResult<Self> {
        let mut headers = HeaderMap::new();
        if let Some(request_id) = &config.request_id {
            let value =
                HeaderValue::from_str(request_id).map_err(|_| GatewayError::InvalidRequestId {
                    value: request_id.clone(),
                })?;
            headers.insert(HEADER_REQUEST_ID, value);
        }
        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(|source| GatewayError::Client { source })?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    /// Backend root this gateway talks to.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> GatewayResult<Url> {
        let raw = format!("{}/{path}", self.base_url.as_str().trim_end_matches('/'));
        raw.parse::<Url>()
            .map_err(|source| GatewayError::InvalidUrl { value: raw, source })
    }

    async fn post_trigger(&self, operation: &'static str, path: &str) -> GatewayResult<()> {
        let url = self.endpoint(path)?;
        let response = self
            .client
            .post(url)
            .send()
            .await
            .map_err(|source| GatewayError::Transport { operation, source })?;
        ensure_success(operation, &response)?;
        debug!(operation, "settings backend acknowledged");
        Ok(())
    }
}

fn ensure_success(operation: &'static str, response: &Response) -> GatewayResult<()> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        warn!(operation, status = status.as_u16(), "settings backend returned error status");
        Err(GatewayError::Status {
            operation,
            status: status.as_u16(),
        })
    }
}

#[async_trait]
impl SettingsGateway for HttpSettingsGateway {
    async fn fetch_fragment(&self, keys: &[&str]) -> GatewayResult<Value> {
        const OPERATION: &str = "fetch_fragment";
        let url = self.endpoint(&format!("settings/get/{}", keys.join(",")))?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| GatewayError::Transport {
                operation: OPERATION,
                source,
            })?;
        ensure_success(OPERATION, &response)?;
        let envelope = response
            .json::<Envelope>()
            .await
            .map_err(|source| GatewayError::Decode {
                operation: OPERATION,
                source,
            })?;
        if envelope.success == Some(false) {
            return Err(GatewayError::Backend {
                operation: OPERATION,
                message: envelope.message,
            });
        }
        debug!(keys = %keys.join(","), "fetched settings fragment");
        Ok(envelope
            .data
            .unwrap_or_else(|| Value::Object(Map::new())))
    }

    async fn apply_patch(&self, patch: &Patch) -> GatewayResult<ApplyOutcome> {
        const OPERATION: &str = "apply_patch";
        let url = self.endpoint("settings/set")?;
        let response = self
            .client
            .post(url)
            .json(patch)
            .send()
            .await
            .map_err(|source| GatewayError::Transport {
                operation: OPERATION,
                source,
            })?;
        let status = response.status();
        let envelope = match response.json::<Envelope>().await {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => {
                return Err(GatewayError::Status {
                    operation: OPERATION,
                    status: status.as_u16(),
                });
            }
            Err(source) => {
                return Err(GatewayError::Decode {
                    operation: OPERATION,
                    source,
                });
            }
        };
        let outcome = ApplyOutcome {
            success: status.is_success() && envelope.success.unwrap_or(false),
            message: envelope.message,
        };
        info!(
            keys = patch.len(),
            success = outcome.success,
            "applied settings patch"
        );
        Ok(outcome)
    }

    async fn persist(&self) -> GatewayResult<()> {
        self.post_trigger("persist", "settings/save").await
    }

    async fn reload(&self) -> GatewayResult<()> {
        self.post_trigger("reload", "settings/load").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use httpmock::prelude::*;
    use serde_json::json;

    fn gateway(server: &MockServer) -> Result<HttpSettingsGateway> {
        Ok(HttpSettingsGateway::new(&GatewayConfig::parse(&server.base_url())?)?)
    }

    #[tokio::test]
    async fn fetch_joins_keys_and_unwraps_data() -> Result<()> {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET).path("/settings/get/downloaders,media,symlink");
            then.status(200).json_body(json!({
                "success": true,
                "data": {"media": {"enabled": true}}
            }));
        });

        let fragment = gateway(&server)?
            .fetch_fragment(&["downloaders", "media", "symlink"])
            .await?;
        mock.assert();
        assert_eq!(fragment, json!({"media": {"enabled": true}}));
        Ok(())
    }

    #[tokio::test]
    async fn fetch_reports_error_status() -> Result<()> {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/settings/get/updaters");
            then.status(502);
        });

        let err = gateway(&server)?
            .fetch_fragment(&["updaters"])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GatewayError::Status {
                operation: "fetch_fragment",
                status: 502
            }
        ));
        Ok(())
    }

    #[tokio::test]
    async fn apply_posts_patch_array() -> Result<()> {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/settings/set")
                .json_body(json!([{"key": "media", "value": {"enabled": false}}]));
            then.status(200)
                .json_body(json!({"success": true, "message": "Settings updated successfully."}));
        });

        let mut patch = Patch::new();
        patch.push("media", json!({"enabled": false}));
        let outcome = gateway(&server)?.apply_patch(&patch).await?;
        mock.assert();
        assert!(outcome.success);
        assert_eq!(outcome.message.as_deref(), Some("Settings updated successfully."));
        Ok(())
    }

    #[tokio::test]
    async fn apply_surfaces_backend_rejection() -> Result<()> {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/settings/set");
            then.status(400)
                .json_body(json!({"success": false, "message": "invalid api key"}));
        });

        let outcome = gateway(&server)?.apply_patch(&Patch::new()).await?;
        assert_eq!(outcome, ApplyOutcome::rejected("invalid api key"));
        Ok(())
    }

    #[tokio::test]
    async fn save_and_load_triggers_hit_their_endpoints() -> Result<()> {
        let server = MockServer::start_async().await;
        let save = server.mock(|when, then| {
            when.method(POST).path("/settings/save");
            then.status(200);
        });
        let load = server.mock(|when, then| {
            when.method(POST).path("/settings/load");
            then.status(200);
        });

        let gateway = gateway(&server)?;
        gateway.persist().await?;
        gateway.reload().await?;
        save.assert();
        load.assert();
        Ok(())
    }

    #[tokio::test]
    async fn request_id_header_is_sent() -> Result<()> {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/settings/save")
                .header(HEADER_REQUEST_ID, "req-1");
            then.status(200);
        });

        let config = GatewayConfig::parse(&server.base_url())?.with_request_id("req-1");
        HttpSettingsGateway::new(&config)?.persist().await?;
        mock.assert();
        Ok(())
    }

    #[test]
    fn endpoint_keeps_base_path_prefix() -> Result<()> {
        let config = GatewayConfig::parse("http://backend:8080/api/")?;
        let gateway = HttpSettingsGateway::new(&config)?;
        assert_eq!(
            gateway.endpoint("settings/save")?.as_str(),
            "http://backend:8080/api/settings/save"
        );
        Ok(())
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(matches!(
            GatewayConfig::parse("not a url"),
            Err(GatewayError::InvalidUrl { .. })
        ));
    }
}
