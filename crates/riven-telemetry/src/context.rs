//! Per-invocation span helpers.
//!
//! # Design
//! - Every CLI invocation runs inside one `riven` span carrying the command
//!   name, a fresh request identifier and the build SHA.

use tracing::Span;
use uuid::Uuid;

use crate::init::build_sha;

/// Identity of one tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandContext {
    /// Subcommand name (`show`, `apply`, ...).
    pub command: String,
    /// Identifier sent as `x-request-id` and recorded on the span.
    pub request_id: Uuid,
}

impl CommandContext {
    /// Context with a fresh request identifier.
    #[must_use]
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            request_id: Uuid::new_v4(),
        }
    }
}

/// Span wrapping the invocation described by `context`.
#[must_use]
pub fn command_span(context: &CommandContext) -> Span {
    tracing::info_span!(
        "riven",
        command = %context.command,
        request_id = %context.request_id,
        build_sha = %build_sha()
    )
}
