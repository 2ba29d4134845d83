//! Gateway wiring, application context, and error types for the CLI.

use std::fmt::{self, Display, Formatter};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use riven_gateway::{
    FileMirror, GatewayConfig, HttpSettingsGateway, MemoryGateway, PageError, SharedGateway,
};
use riven_settings::ValidationErrors;
use riven_telemetry::CommandContext;
use serde_json::Value;
use url::Url;

use crate::cli::Cli;

/// CLI-level error type to distinguish validation from operational failures.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl std::error::Error for CliError {}

impl From<PageError> for CliError {
    fn from(error: PageError) -> Self {
        match error {
            PageError::Validation(errors) => Self::validation(describe_validation(&errors)),
            PageError::Rejected { message } => {
                let summary = PageError::Rejected { message: None }.to_string();
                Self::validation(message.map_or_else(
                    || summary.clone(),
                    |detail| format!("{summary} ({detail})"),
                ))
            }
            other => Self::failure(other),
        }
    }
}

/// One line per failing field, prefixed by a summary.
pub(crate) fn describe_validation(errors: &ValidationErrors) -> String {
    let lines: Vec<String> = errors
        .iter()
        .map(|error| format!("  {}: {}", error.field, error.message))
        .collect();
    format!("{errors}\n{}", lines.join("\n"))
}

/// Dependencies constructed from environment flags and CLI options.
#[derive(Clone)]
pub(crate) struct CliDependencies {
    pub(crate) gateway: SharedGateway,
    pub(crate) mirror: Option<FileMirror>,
}

impl CliDependencies {
    /// Build the gateway (HTTP, or in-memory for `--offline`) and the optional mirror.
    pub(crate) async fn from_cli(cli: &Cli, context: &CommandContext) -> CliResult<Self> {
        let gateway: SharedGateway = match &cli.offline {
            Some(path) => Arc::new(MemoryGateway::with_document(read_json(path).await?)),
            None => {
                let config = GatewayConfig::new(cli.backend_url.clone())
                    .with_timeout(Duration::from_secs(cli.timeout))
                    .with_request_id(context.request_id.to_string());
                let gateway = HttpSettingsGateway::new(&config)
                    .context("failed to build settings gateway")
                    .map_err(CliError::failure)?;
                Arc::new(gateway)
            }
        };
        Ok(Self {
            gateway,
            mirror: cli.home.as_deref().map(FileMirror::from_home),
        })
    }
}

/// Application context passed to command handlers.
#[derive(Clone)]
pub(crate) struct AppContext {
    pub(crate) gateway: SharedGateway,
    pub(crate) mirror: Option<FileMirror>,
}

impl AppContext {
    pub(crate) fn mirror(&self) -> CliResult<&FileMirror> {
        self.mirror.as_ref().ok_or_else(|| {
            CliError::validation("home directory is required (pass --home or set RIVEN_HOME)")
        })
    }
}

/// Parse the backend URL provided to the CLI.
pub(crate) fn parse_url(input: &str) -> Result<Url, String> {
    input
        .parse::<Url>()
        .map_err(|err| format!("invalid URL '{input}': {err}"))
}

/// Read a JSON document from disk.
pub(crate) async fn read_json(path: &Path) -> CliResult<Value> {
    let payload = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))
        .map_err(CliError::failure)?;
    serde_json::from_str(&payload).map_err(|err| {
        CliError::validation(format!("{} is not valid JSON: {err}", path.display()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use riven_gateway::GatewayError;

    #[test]
    fn validation_failures_exit_with_two() {
        let mut errors = ValidationErrors::new();
        errors.push("email", "Invalid email address");
        let err = CliError::from(PageError::Validation(errors));
        assert_eq!(err.exit_code(), 2);
        assert_eq!(
            err.display_message(),
            "1 field(s) failed validation\n  email: Invalid email address"
        );
    }

    #[test]
    fn rejection_keeps_backend_detail() {
        let err = CliError::from(PageError::Rejected {
            message: Some("plex unreachable".to_string()),
        });
        assert_eq!(err.exit_code(), 2);
        assert_eq!(
            err.display_message(),
            "Service(s) failed to initialize. Please check your settings. (plex unreachable)"
        );
    }

    #[test]
    fn transport_failures_exit_with_three() {
        let err = CliError::from(PageError::Unavailable {
            source: GatewayError::Offline {
                operation: "fetch_fragment",
            },
        });
        assert_eq!(err.exit_code(), 3);
        assert!(
            err.display_message()
                .starts_with("Unable to fetch settings data. API is down.")
        );
    }

    #[tokio::test]
    async fn invalid_json_file_is_a_validation_error() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("form.json");
        std::fs::write(&path, "{")?;
        let err = read_json(&path).await.unwrap_err();
        assert_eq!(err.exit_code(), 2);
        let missing = read_json(&dir.path().join("absent.json")).await.unwrap_err();
        assert_eq!(missing.exit_code(), 3);
        Ok(())
    }

    #[test]
    fn missing_home_is_reported() {
        let ctx = AppContext {
            gateway: Arc::new(MemoryGateway::new()),
            mirror: None,
        };
        assert!(matches!(ctx.mirror(), Err(CliError::Validation(_))));
    }

    #[test]
    fn url_parser_reports_input() {
        assert!(parse_url("http://127.0.0.1:8080").is_ok());
        let err = anyhow::anyhow!(parse_url("::").unwrap_err());
        assert!(err.to_string().contains("'::'"));
    }
}
