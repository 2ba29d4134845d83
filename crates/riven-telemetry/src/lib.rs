#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls
)]
#![warn(missing_docs, unreachable_pub, dead_code, unused)]

//! Logging primitives shared across the Riven settings tools.
//!
//! Layout: `init.rs` (subscriber installation and formats), `context.rs`
//! (per-invocation spans), `error.rs` (telemetry errors).

pub mod context;
pub mod error;
pub mod init;

pub use context::{CommandContext, command_span};
pub use error::{Result, TelemetryError};
pub use init::{DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, build_sha, init_logging};
